// Copyright (c) 2025 - Cowboy AI, Inc.
//! Neutron Overlay Resolver
//!
//! Provider and external networks are not first-class entries of the
//! deployment model. They are declared in the `data` of the configuration-data
//! entry providing the networking service, and tied to network groups through
//! tags naming a physical network.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{DeploymentModel, Link, NeutronNetwork, ServiceGroupKind};
use crate::errors::TopologyResult;

/// Service provided by the networking configuration data
pub const NEUTRON_SERVICE: &str = "neutron";

/// Tag marking a network group as the external bridge network
pub const EXTERNAL_BRIDGE_TAG: &str = "neutron.l3_agent.external_network_bridge";

/// Physical network key used for the external bridge network
pub const EXTERNAL_PHYSNET: &str = "external";

const PROVIDER_PHYSNET_ATTR: &str = "provider-physical-network";
const EXTERNAL_NETWORKS: &str = "neutron_external_networks";
const PROVIDER_NETWORKS: &str = "neutron_provider_networks";

/// Pick the configuration-data entry providing the networking service
///
/// Candidates are scanned per control plane: cluster references, resource
/// references, then the control plane's own references. The first match
/// wins; later matches are ignored.
pub fn select_neutron_config(model: &DeploymentModel) -> Option<String> {
    let mut candidates = Vec::new();
    for cp in model.control_planes.values() {
        for kind in [ServiceGroupKind::Cluster, ServiceGroupKind::Resource] {
            for group in cp.service_groups(kind).values() {
                candidates.extend(group.configuration_data.iter().filter_map(Link::key));
            }
        }
        candidates.extend(cp.configuration_data.iter().filter_map(Link::key));
    }

    let mut providers = candidates.into_iter().filter(|key| {
        model
            .configuration_data
            .get(*key)
            .is_some_and(|config| config.provides(NEUTRON_SERVICE))
    });

    let selected = providers.next().map(str::to_string);
    if let Some(other) = providers.find(|key| Some(*key) != selected.as_deref()) {
        warn!(
            "Ignoring additional neutron configuration data {} (using {:?})",
            other, selected
        );
    }
    selected
}

/// Read the provider and external networks declared in a configuration-data payload
///
/// External networks come first; a provider network with the same name
/// replaces the external one in place.
pub fn collect_neutron_networks(data: &Value) -> TopologyResult<IndexMap<String, NeutronNetwork>> {
    let mut networks = IndexMap::new();

    for (section, external) in [(EXTERNAL_NETWORKS, true), (PROVIDER_NETWORKS, false)] {
        let Some(list) = data.get(section).filter(|v| !v.is_null()) else {
            continue;
        };
        let declared: Vec<NeutronNetwork> = serde_json::from_value(list.clone())?;
        for mut network in declared {
            network.external = external;
            networks.insert(network.name.clone(), network);
        }
    }

    Ok(networks)
}

/// Physical network a tag refers to, if any
///
/// A tag is either a bare string or a single-entry map whose value may carry
/// a `provider-physical-network`. The external bridge marker maps to
/// [`EXTERNAL_PHYSNET`].
pub fn tag_physical_network(tag: &Value) -> Option<String> {
    match tag {
        Value::String(name) if name == EXTERNAL_BRIDGE_TAG => Some(EXTERNAL_PHYSNET.to_string()),
        Value::Object(entries) => match entries.values().next()? {
            Value::String(name) if name == EXTERNAL_BRIDGE_TAG => {
                Some(EXTERNAL_PHYSNET.to_string())
            }
            Value::Object(attrs) => attrs
                .get(PROVIDER_PHYSNET_ATTR)
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        },
        _ => None,
    }
}

/// Index neutron networks by physical network
///
/// A network without provider data is only indexed when it is external, under
/// [`EXTERNAL_PHYSNET`]. Later networks win on duplicate physical networks.
pub fn physical_network_index(networks: &IndexMap<String, NeutronNetwork>) -> IndexMap<String, String> {
    let mut index = IndexMap::new();
    for network in networks.values() {
        let physnet = match network.provider() {
            Some(provider) => match &provider.physical_network {
                Some(physnet) => physnet.clone(),
                None => continue,
            },
            None if network.external => EXTERNAL_PHYSNET.to_string(),
            None => continue,
        };
        index.insert(physnet, network.name.clone());
    }
    index
}

/// Attach neutron networks to the network groups tagged with their physical network
///
/// Rebuilds `model.neutron_networks` and every group's neutron association
/// from scratch, so running it again over its own output changes nothing.
pub fn resolve_overlay(model: &mut DeploymentModel) -> TopologyResult<()> {
    for group in model.network_groups.values_mut() {
        group.neutron_tags.clear();
        group.neutron_networks.clear();
    }
    model.neutron_networks.clear();

    let Some(config) = model
        .neutron_config_data
        .as_ref()
        .and_then(|name| model.configuration_data.get(name))
    else {
        debug!("No neutron configuration data, skipping overlay networks");
        return Ok(());
    };

    model.neutron_networks = collect_neutron_networks(&config.data)?;

    let declared_tags = config.network_tags.clone();
    for tag in declared_tags {
        match model.network_groups.get_mut(&tag.network_group) {
            Some(group) => group.neutron_tags.extend(tag.tags),
            None => debug!(
                "Ignoring neutron tags for unknown network group {}",
                tag.network_group
            ),
        }
    }
    for group in model.network_groups.values_mut() {
        let legacy = group.tags.clone();
        group.neutron_tags.extend(legacy);
    }

    let index = physical_network_index(&model.neutron_networks);
    let mut associations = 0;
    for group in model.network_groups.values_mut() {
        for tag in &group.neutron_tags {
            let Some(physnet) = tag_physical_network(tag) else {
                continue;
            };
            let Some(network_name) = index.get(&physnet) else {
                continue;
            };
            if let Some(network) = model.neutron_networks.get_mut(network_name) {
                network.network_groups.insert(group.name.clone());
                group
                    .neutron_networks
                    .insert(physnet, network_name.clone());
                associations += 1;
            }
        }
    }

    info!(
        "Resolved {} neutron networks with {} network group associations",
        model.neutron_networks.len(),
        associations
    );
    Ok(())
}
