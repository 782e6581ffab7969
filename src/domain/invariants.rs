// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Normalized Graph Invariants
//!
//! After normalization every entity left in the graph must be load-bearing:
//! reachable from a root through the same reference used to decide whether
//! it survives pruning, and every forward reference kept must point at an
//! entity that is still present.
//!
//! All functions are pure and report the first violation found.

use indexmap::IndexMap;

use crate::domain::model::{
    DeploymentModel, Entity, Link, RefKind, Route, ServiceGroupKind,
};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Entity kept although nothing references it
    #[error("{kind} {name} is not referenced by any {expected}")]
    Unreferenced {
        kind: &'static str,
        name: String,
        expected: &'static str,
    },

    /// Resolved reference to an entity that is no longer present
    #[error("{kind} {name} references missing {target_kind} {target}")]
    DanglingReference {
        kind: &'static str,
        name: String,
        target_kind: &'static str,
        target: String,
    },

    /// Required reference left unresolved on a kept entity
    #[error("{kind} {name} has no resolved {field}")]
    UnresolvedReference {
        kind: &'static str,
        name: String,
        field: &'static str,
    },
}

fn require_referrers<T: Entity>(
    entities: &IndexMap<String, T>,
    kinds: &[RefKind],
    kind: &'static str,
    expected: &'static str,
) -> ValidationResult {
    match entities
        .iter()
        .find(|(_, entity)| !entity.back_refs().any_of(kinds))
    {
        Some((name, _)) => Err(ValidationError::Unreferenced {
            kind,
            name: name.clone(),
            expected,
        }),
        None => Ok(()),
    }
}

fn require_target<T>(
    link: &Link,
    targets: &IndexMap<String, T>,
    kind: &'static str,
    name: &str,
    target_kind: &'static str,
) -> ValidationResult {
    match link {
        Link::Resolved(target) if !targets.contains_key(target) => {
            Err(ValidationError::DanglingReference {
                kind,
                name: name.to_string(),
                target_kind,
                target: target.clone(),
            })
        }
        _ => Ok(()),
    }
}

fn require_resolved(
    link: &Link,
    kind: &'static str,
    name: &str,
    field: &'static str,
) -> ValidationResult {
    if link.is_resolved() {
        Ok(())
    } else {
        Err(ValidationError::UnresolvedReference {
            kind,
            name: name.to_string(),
            field,
        })
    }
}

/// Validate that a normalized graph is closed under its references
///
/// # Rules
/// - Configuration data is referenced by a control plane, cluster or resource
/// - Server roles are referenced by a cluster or resource
/// - Interface and disk models are referenced by a server role
/// - Network groups are referenced by a network interface
/// - NIC mappings are referenced by a server
/// - Server groups are referenced by a server or listed by another group
/// - Clusters, resources, networks and servers resolve their owning reference
/// - No resolved reference points at a removed entity
pub fn validate_referential_closure(model: &DeploymentModel) -> ValidationResult {
    require_referrers(
        &model.configuration_data,
        &[RefKind::ControlPlanes, RefKind::Clusters, RefKind::Resources],
        "configuration-data",
        "control plane, cluster or resource",
    )?;
    require_referrers(
        &model.server_roles,
        &[RefKind::Clusters, RefKind::Resources],
        "server-role",
        "cluster or resource",
    )?;
    require_referrers(
        &model.interface_models,
        &[RefKind::ServerRoles],
        "interface-model",
        "server role",
    )?;
    require_referrers(
        &model.disk_models,
        &[RefKind::ServerRoles],
        "disk-model",
        "server role",
    )?;
    require_referrers(
        &model.network_groups,
        &[RefKind::NetworkInterfaces],
        "network-group",
        "network interface",
    )?;
    require_referrers(&model.nic_mappings, &[RefKind::Servers], "nic-mapping", "server")?;

    require_referrers(
        &model.server_groups,
        &[RefKind::Servers, RefKind::ServerGroupParents],
        "server-group",
        "server or parent server group",
    )?;

    for (name, group) in &model.server_groups {
        for link in group.networks.iter() {
            require_target(link, &model.networks, "server-group", name, "network")?;
        }
        for link in group.server_groups.iter() {
            require_target(link, &model.server_groups, "server-group", name, "server-group")?;
        }
    }

    for cp in model.control_planes.values() {
        for kind in [ServiceGroupKind::Cluster, ServiceGroupKind::Resource] {
            for group in cp.service_groups(kind).values() {
                let name = group.ref_key();
                require_resolved(&group.server_role, "service group", &name, "server-role")?;
                require_target(
                    &group.server_role,
                    &model.server_roles,
                    "service group",
                    &name,
                    "server-role",
                )?;
            }
        }
    }

    for (name, role) in &model.server_roles {
        require_target(&role.interface_model, &model.interface_models, "server-role", name, "interface-model")?;
        require_target(&role.disk_model, &model.disk_models, "server-role", name, "disk-model")?;
    }

    for (name, group) in &model.network_groups {
        for route in &group.routes {
            match route {
                Route::NetworkGroup(target) if !model.network_groups.contains_key(target) => {
                    return Err(ValidationError::DanglingReference {
                        kind: "network-group",
                        name: name.clone(),
                        target_kind: "network-group",
                        target: target.clone(),
                    });
                }
                Route::NeutronNetwork(target) if !model.neutron_networks.contains_key(target) => {
                    return Err(ValidationError::DanglingReference {
                        kind: "network-group",
                        name: name.clone(),
                        target_kind: "neutron network",
                        target: target.clone(),
                    });
                }
                _ => {}
            }
        }
    }

    for (name, network) in &model.networks {
        require_resolved(&network.network_group, "network", name, "network-group")?;
        require_target(&network.network_group, &model.network_groups, "network", name, "network-group")?;
    }

    for (id, server) in &model.servers {
        require_resolved(&server.role, "server", id, "role")?;
        require_target(&server.role, &model.server_roles, "server", id, "server-role")?;
        require_target(&server.nic_mapping, &model.nic_mappings, "server", id, "nic-mapping")?;
        require_target(&server.server_group, &model.server_groups, "server", id, "server-group")?;
    }

    for (name, rule) in &model.firewall_rules {
        for link in &rule.network_groups {
            require_resolved(link, "firewall-rule", name, "network-groups")?;
            require_target(link, &model.network_groups, "firewall-rule", name, "network-group")?;
        }
    }

    Ok(())
}
