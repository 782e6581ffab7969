// Copyright (c) 2025 - Cowboy AI, Inc.
//! Virtual Machine Placement
//!
//! # Classification
//! Evaluated over the clusters, then the resources, a server's role takes
//! part in:
//! - a group hosting `nova-compute` makes the server a compute node
//! - any other group hosting a component outside the management-plane
//!   baseline makes it a controller
//! - a group hosting `lifecycle-manager` makes it a lifecycle manager; only
//!   the first such server becomes the admin server
//!
//! Classes are not exclusive. When no flavor is configured for the server or
//! its role, the default flavor of the first class applying to it is used.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{DeploymentModel, Server, ServiceGroup};
use crate::errors::{TopologyError, TopologyResult};
use crate::topology::VirtualServer;
use crate::virt_config::VirtConfig;

/// Service component of compute nodes
pub const COMPUTE_COMPONENT: &str = "nova-compute";

/// Service component of the lifecycle manager
pub const LIFECYCLE_MANAGER_COMPONENT: &str = "lifecycle-manager";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerClass {
    Compute,
    Controller,
    LifecycleManager,
}

impl ServerClass {
    /// Flavor catalog key holding the default flavor of the class
    pub fn default_flavor_key(self) -> &'static str {
        match self {
            ServerClass::Compute => "default_compute_flavor",
            ServerClass::Controller => "default_controller_flavor",
            ServerClass::LifecycleManager => "default_clm_flavor",
        }
    }
}

/// Classes of a server, in the order its service groups introduce them
pub fn classify(groups: &[&ServiceGroup], virt: &VirtConfig) -> Vec<ServerClass> {
    let mut classes = Vec::new();
    let mut add = |class: ServerClass| {
        if !classes.contains(&class) {
            classes.push(class);
        }
    };

    for group in groups {
        if group.hosts(COMPUTE_COMPONENT) {
            add(ServerClass::Compute);
        } else if group
            .service_components
            .iter()
            .any(|component| !virt.is_clm_component(component))
        {
            add(ServerClass::Controller);
        }
        if group.hosts(LIFECYCLE_MANAGER_COMPONENT) {
            add(ServerClass::LifecycleManager);
        }
    }

    classes
}

/// First server, in order, classified as lifecycle manager
pub fn elect_admin<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a [ServerClass])>,
{
    candidates
        .into_iter()
        .find(|(_, classes)| classes.contains(&ServerClass::LifecycleManager))
        .map(|(name, _)| name)
}

struct Placement<'a> {
    server: &'a Server,
    role: &'a str,
    interface_model: &'a str,
    disk_model: &'a str,
    classes: Vec<ServerClass>,
}

fn place<'a>(model: &'a DeploymentModel, server: &'a Server, virt: &VirtConfig) -> Option<Placement<'a>> {
    let role = server
        .role
        .key()
        .and_then(|key| model.server_roles.get(key))?;

    let (Some(interface_model), Some(disk_model)) =
        (role.interface_model.key(), role.disk_model.key())
    else {
        warn!(
            "Skipping server {}: role {} lacks an interface or disk model",
            server.id, role.name
        );
        return None;
    };

    Some(Placement {
        server,
        role: &role.name,
        interface_model,
        disk_model,
        classes: classify(&model.service_groups_of(role), virt),
    })
}

/// Build one virtual machine per server, in server order
pub fn build_servers(model: &DeploymentModel, virt: &VirtConfig) -> TopologyResult<Vec<VirtualServer>> {
    let placements: Vec<Placement<'_>> = model
        .servers
        .values()
        .filter_map(|server| place(model, server, virt))
        .collect();

    let admin = elect_admin(
        placements
            .iter()
            .map(|p| (p.server.id.as_str(), p.classes.as_slice())),
    );
    if admin.is_none() {
        debug!("No server hosts {}", LIFECYCLE_MANAGER_COMPONENT);
    }

    let servers = placements
        .iter()
        .map(|placement| -> TopologyResult<VirtualServer> {
            let id = placement.server.id.as_str();
            let is_admin = admin == Some(id);

            let distro = virt.distro_for(placement.server.distro_id.as_deref());
            let image = virt
                .image_for(id, placement.role, distro)
                .ok_or_else(|| TopologyError::MissingImage {
                    server: id.to_string(),
                    distro: distro.to_string(),
                })?;

            let flavor = virt
                .explicit_flavor(id, placement.role)
                .or_else(|| {
                    placement
                        .classes
                        .iter()
                        .filter(|class| **class != ServerClass::LifecycleManager || is_admin)
                        .find_map(|class| virt.class_flavor(*class))
                })
                .ok_or_else(|| TopologyError::MissingFlavor {
                    server: id.to_string(),
                })?;

            Ok(VirtualServer {
                name: id.to_string(),
                ip_addr: placement.server.ip_addr.clone(),
                role: placement.role.to_string(),
                interface_model: placement.interface_model.to_string(),
                disk_model: placement.disk_model.to_string(),
                image: image.to_string(),
                flavor: flavor.to_string(),
                is_admin,
                is_controller: placement.classes.contains(&ServerClass::Controller),
                is_compute: placement.classes.contains(&ServerClass::Compute),
            })
        })
        .collect::<TopologyResult<Vec<_>>>()?;

    info!(
        "Placed {} servers (admin: {})",
        servers.len(),
        admin.unwrap_or("none")
    );
    Ok(servers)
}
