// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model Normalizer
//!
//! Turns the list-based deployment document into a linked, pruned graph.
//!
//! # Linking Order
//!
//! ```text
//! control planes ──► configuration data, server roles   (prune both)
//! server roles ────► interface models, disk models      (prune both)
//! interfaces ──────► network groups                     (prune)
//! neutron overlay ─► network groups ◄──► neutron networks
//! routes, networks, servers ──► nic mappings             (prune)
//! server groups ───► networks, child server groups      (prune)
//! firewall rules ──► network groups
//! ```
//!
//! A class is pruned only once every class that can refer to it is linked.

pub mod linker;
pub mod neutron;
pub mod prune;

use indexmap::IndexMap;
use serde_json::Value;
use std::mem;
use tracing::{debug, info, warn};

use crate::domain::{
    validate_referential_closure, DeploymentModel, NetworkGroup, NeutronNetwork, RefKind, Route,
    ServiceGroupKind,
};
use crate::errors::TopologyResult;

pub use linker::{link, link_all, BackRef};
pub use prune::{prune_server_groups, prune_unreferenced};

/// Read and normalize a raw deployment document
///
/// The document is copied before anything is touched.
pub fn normalize(document: &Value) -> TopologyResult<DeploymentModel> {
    let mut model = DeploymentModel::from_document(document)?;
    normalize_model(&mut model)?;
    Ok(model)
}

/// Link and prune a deployment model in place
///
/// Running it again over its own output is a no-op.
pub fn normalize_model(model: &mut DeploymentModel) -> TopologyResult<()> {
    link_control_planes(model);

    model.neutron_config_data = neutron::select_neutron_config(model);

    prune_unreferenced(
        &mut model.configuration_data,
        &[RefKind::ControlPlanes, RefKind::Clusters, RefKind::Resources],
    );
    prune_unreferenced(&mut model.server_roles, &[RefKind::Clusters, RefKind::Resources]);

    link_server_roles(model);
    prune_unreferenced(&mut model.interface_models, &[RefKind::ServerRoles]);
    prune_unreferenced(&mut model.disk_models, &[RefKind::ServerRoles]);

    link_interfaces(model);
    prune_unreferenced(&mut model.network_groups, &[RefKind::NetworkInterfaces]);

    neutron::resolve_overlay(model)?;
    link_routes(model);
    link_networks(model);

    link_servers(model);
    prune_unreferenced(&mut model.nic_mappings, &[RefKind::Servers]);

    link_server_groups(model);
    link_firewall_rules(model);

    if let Err(violation) = validate_referential_closure(model) {
        warn!("Normalized model is not closed: {}", violation);
    }

    info!(
        "Normalized model: {} server roles, {} interface models, {} disk models, \
         {} network groups, {} networks, {} servers, {} server groups",
        model.server_roles.len(),
        model.interface_models.len(),
        model.disk_models.len(),
        model.network_groups.len(),
        model.networks.len(),
        model.servers.len(),
        model.server_groups.len(),
    );
    Ok(())
}

fn link_control_planes(model: &mut DeploymentModel) {
    let DeploymentModel {
        control_planes,
        configuration_data,
        server_roles,
        ..
    } = model;

    for cp in control_planes.values_mut() {
        let cp_name = cp.name.clone();
        link_all(
            &mut cp.configuration_data,
            configuration_data,
            Some(BackRef::new(RefKind::ControlPlanes, &cp_name)),
        );

        for kind in [ServiceGroupKind::Cluster, ServiceGroupKind::Resource] {
            let groups = cp.service_groups_mut(kind);
            for group in groups.values_mut() {
                group.control_plane = cp_name.clone();
                let key = group.ref_key();
                if link(
                    &mut group.server_role,
                    server_roles,
                    Some(BackRef::new(kind.ref_kind(), &key)),
                )
                .is_none()
                {
                    continue;
                }
                link_all(
                    &mut group.configuration_data,
                    configuration_data,
                    Some(BackRef::new(kind.ref_kind(), &key)),
                );
            }

            groups.retain(|name, group| {
                let kept = group.server_role.is_resolved();
                if !kept {
                    warn!(
                        "Dropping {:?} {} of control plane {}: server role {:?} not found",
                        kind,
                        name,
                        cp_name,
                        group.server_role.declared()
                    );
                }
                kept
            });
        }
    }
}

fn link_server_roles(model: &mut DeploymentModel) {
    let DeploymentModel {
        server_roles,
        interface_models,
        disk_models,
        ..
    } = model;

    for role in server_roles.values_mut() {
        let back_ref = Some(BackRef::new(RefKind::ServerRoles, &role.name));
        if link(&mut role.interface_model, interface_models, back_ref).is_none() {
            warn!(
                "Server role {} references unknown interface model {:?}",
                role.name,
                role.interface_model.declared()
            );
        }
        if link(&mut role.disk_model, disk_models, back_ref).is_none() {
            warn!(
                "Server role {} references unknown disk model {:?}",
                role.name,
                role.disk_model.declared()
            );
        }
    }
}

fn link_interfaces(model: &mut DeploymentModel) {
    let DeploymentModel {
        interface_models,
        network_groups,
        ..
    } = model;

    for interface_model in interface_models.values_mut() {
        for interface in interface_model.network_interfaces.values_mut() {
            interface.interface_model = interface_model.name.clone();
            let key = interface.ref_key();
            let back_ref = Some(BackRef::new(RefKind::NetworkInterfaces, &key));
            link_all(&mut interface.network_groups, network_groups, back_ref);
            link_all(&mut interface.forced_network_groups, network_groups, back_ref);
        }
    }
}

fn resolve_route(
    route: Route,
    referrer: &str,
    groups: &mut IndexMap<String, NetworkGroup>,
    neutron_networks: &mut IndexMap<String, NeutronNetwork>,
) -> Route {
    let target = match route {
        Route::Default => return Route::Default,
        other => other.target().to_string(),
    };

    if let Some(group) = groups.get_mut(&target) {
        group.refs.record(RefKind::NetworkGroupRoutes, referrer);
        Route::NetworkGroup(target)
    } else if let Some(network) = neutron_networks.get_mut(&target) {
        network.refs.record(RefKind::NetworkGroupRoutes, referrer);
        Route::NeutronNetwork(target)
    } else {
        warn!("Network group {} routes to unknown network {}", referrer, target);
        Route::Unresolved(target)
    }
}

fn link_routes(model: &mut DeploymentModel) {
    let names: Vec<String> = model.network_groups.keys().cloned().collect();
    for name in names {
        let Some(group) = model.network_groups.get_mut(&name) else {
            continue;
        };
        let routes = mem::take(&mut group.routes);
        let routes = routes
            .into_iter()
            .map(|route| {
                resolve_route(
                    route,
                    &name,
                    &mut model.network_groups,
                    &mut model.neutron_networks,
                )
            })
            .collect();
        if let Some(group) = model.network_groups.get_mut(&name) {
            group.routes = routes;
        }
    }
}

fn link_networks(model: &mut DeploymentModel) {
    let DeploymentModel {
        networks,
        network_groups,
        ..
    } = model;

    let dropped = prune::prune_where(networks, |_, network| {
        linker::resolves(&network.network_group, network_groups)
    });
    for name in &dropped {
        warn!("Dropping network {}: its network group is not in use", name);
    }

    for network in networks.values_mut() {
        let back_ref = Some(BackRef::new(RefKind::Networks, &network.name));
        link(&mut network.network_group, network_groups, back_ref);
    }
}

fn link_servers(model: &mut DeploymentModel) {
    let DeploymentModel {
        servers,
        server_roles,
        nic_mappings,
        server_groups,
        ..
    } = model;

    let dropped = prune::prune_where(servers, |_, server| {
        linker::resolves(&server.role, server_roles)
    });
    for id in &dropped {
        warn!("Dropping server {}: its role is not in use", id);
    }

    for server in servers.values_mut() {
        let back_ref = Some(BackRef::new(RefKind::Servers, &server.id));
        link(&mut server.role, server_roles, back_ref);
        link(&mut server.nic_mapping, nic_mappings, back_ref);
        if server.server_group.declared().is_some()
            && link(&mut server.server_group, server_groups, back_ref).is_none()
        {
            debug!(
                "Server {} references unknown server group {:?}",
                server.id,
                server.server_group.declared()
            );
        }
    }
}

fn link_server_groups(model: &mut DeploymentModel) {
    let names: Vec<String> = model.server_groups.keys().cloned().collect();
    for name in names {
        let Some(group) = model.server_groups.get_mut(&name) else {
            continue;
        };
        let mut networks = mem::take(&mut group.networks);
        let mut children = mem::take(&mut group.server_groups);

        link_all(
            &mut networks,
            &mut model.networks,
            Some(BackRef::new(RefKind::ServerGroups, &name)),
        );
        link_all(
            &mut children,
            &mut model.server_groups,
            Some(BackRef::new(RefKind::ServerGroupParents, &name)),
        );

        if let Some(group) = model.server_groups.get_mut(&name) {
            group.networks = networks;
            group.server_groups = children;
        }
    }

    let removed = prune_server_groups(&mut model.server_groups);
    prune::forget_referrers(&mut model.networks, RefKind::ServerGroups, &removed);
}

fn link_firewall_rules(model: &mut DeploymentModel) {
    let DeploymentModel {
        firewall_rules,
        network_groups,
        ..
    } = model;

    let dropped = prune::prune_where(firewall_rules, |_, rule| {
        rule.network_groups
            .iter()
            .all(|group| linker::resolves(group, network_groups))
    });
    for name in &dropped {
        warn!("Dropping firewall rule {}: a network group is not in use", name);
    }

    for rule in firewall_rules.values_mut() {
        let back_ref = Some(BackRef::new(RefKind::FirewallRules, &rule.name));
        link_all(&mut rule.network_groups, network_groups, back_ref);
    }
}
