// Copyright (c) 2025 - Cowboy AI, Inc.
//! Port Layout per Interface Model

use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::{DeploymentModel, InterfaceModel, RefKind};
use crate::topology::{VirtualInterfaceModel, VirtualNetwork, VirtualPort};

/// Build the ports of one interface model
///
/// Each logical interface contributes one port, or one per member device
/// when bonded. A port lists the networks of every network group it carries
/// plus the neutron networks of those groups that made it into `networks`.
///
/// The first primary port carrying the management network comes first;
/// every other port follows, sorted by device name.
pub fn build_interface_model(
    model: &DeploymentModel,
    interface_model: &InterfaceModel,
    networks: &IndexMap<String, VirtualNetwork>,
    management: Option<&str>,
) -> VirtualInterfaceModel {
    let mut management_ports: BTreeMap<String, VirtualPort> = BTreeMap::new();
    let mut ports: BTreeMap<String, VirtualPort> = BTreeMap::new();

    for interface in interface_model.network_interfaces.values() {
        let devices = match &interface.bond_data {
            Some(bond) => bond.devices.as_slice(),
            None => std::slice::from_ref(&interface.device),
        };

        for device in devices {
            let mut port = VirtualPort {
                name: device.name.clone(),
                networks: Vec::new(),
                bond: None,
                primary: None,
            };
            if let Some(bond) = &interface.bond_data {
                port.bond = Some(interface.device.name.clone());
                port.primary = Some(bond.primary().map_or(true, |primary| primary == device.name));
            }

            let mut carries_management = false;
            for group in interface
                .all_network_groups()
                .filter_map(|link| link.key())
                .filter_map(|key| model.network_groups.get(key))
            {
                port.networks
                    .extend(group.refs.get(RefKind::Networks).map(str::to_string));
                port.networks.extend(
                    group
                        .neutron_networks
                        .values()
                        .filter(|name| networks.contains_key(*name))
                        .cloned(),
                );

                if management.is_some_and(|mgmt| group.refs.contains(RefKind::Networks, mgmt)) {
                    carries_management = true;
                }
            }

            if carries_management && management_ports.is_empty() && port.primary.unwrap_or(true) {
                debug!(
                    "Port {} of {} carries the management network",
                    port.name, interface_model.name
                );
                management_ports.insert(port.name.clone(), port);
            } else {
                ports.insert(port.name.clone(), port);
            }
        }
    }

    VirtualInterfaceModel {
        name: interface_model.name.clone(),
        ports: management_ports.into_values().chain(ports.into_values()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn model() -> DeploymentModel {
        normalize(&json!({
            "control-planes": [{
                "name": "cp1",
                "clusters": [{"name": "c0", "server-role": "ROLE"}]
            }],
            "server-roles": [{"name": "ROLE", "interface-model": "IFACES"}],
            "interface-models": [{
                "name": "IFACES",
                "network-interfaces": [
                    {"name": "eth0", "device": {"name": "eth0"}, "network-groups": ["EXTERNAL-API"]},
                    {"name": "bond0", "device": {"name": "bond0"},
                     "bond-data": {
                        "devices": [{"name": "hed2"}, {"name": "hed1"}],
                        "options": {"primary": "hed1"}
                     },
                     "network-groups": ["MANAGEMENT"]}
                ]
            }],
            "network-groups": [{"name": "MANAGEMENT"}, {"name": "EXTERNAL-API"}],
            "networks": [
                {"name": "MANAGEMENT-NET", "network-group": "MANAGEMENT"},
                {"name": "EXTERNAL-API-NET", "network-group": "EXTERNAL-API"}
            ],
            "servers": []
        }))
        .unwrap()
    }

    #[test]
    fn test_bond_primary_carries_management() {
        let model = model();
        let networks: IndexMap<String, VirtualNetwork> = model
            .networks
            .keys()
            .map(|name| (name.clone(), VirtualNetwork::new(name)))
            .collect();

        let built = build_interface_model(
            &model,
            &model.interface_models["IFACES"],
            &networks,
            Some("MANAGEMENT-NET"),
        );

        let names: Vec<&str> = built.ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["hed1", "eth0", "hed2"]);
        assert_eq!(built.ports[0].bond.as_deref(), Some("bond0"));
        assert_eq!(built.ports[0].primary, Some(true));
        assert_eq!(built.ports[0].networks, vec!["MANAGEMENT-NET".to_string()]);
        assert_eq!(built.ports[1].bond, None);
        assert_eq!(built.ports[2].primary, Some(false));
    }

    #[test]
    fn test_without_management_ports_are_sorted() {
        let model = model();
        let built = build_interface_model(
            &model,
            &model.interface_models["IFACES"],
            &IndexMap::new(),
            None,
        );

        let names: Vec<&str> = built.ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["eth0", "hed1", "hed2"]);
    }
}
