// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Generator
//!
//! Walks a normalized [`DeploymentModel`] and derives the virtual
//! infrastructure needed to host it: networks with their subnets and
//! routers, one port layout per interface model, one volume layout per disk
//! model, and one virtual machine per server.
//!
//! Every descriptor refers to other descriptors by name only, so the result
//! serializes as plain nested maps and lists.

pub mod networks;
pub mod ports;
pub mod servers;
pub mod volumes;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::info;

use crate::domain::{DeploymentModel, IpCidr, VlanId};
use crate::errors::{TopologyError, TopologyResult};
use crate::virt_config::VirtConfig;

pub use networks::{carve_allocation_pool, coalesce_routers, plan_networks, NetworkPlan};
pub use ports::build_interface_model;
pub use servers::{build_servers, classify, elect_admin, ServerClass};
pub use volumes::build_disk_model;

/// Virtual infrastructure descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub description: String,
    pub networks: IndexMap<String, VirtualNetwork>,
    pub routers: Vec<Router>,
    pub interface_models: IndexMap<String, VirtualInterfaceModel>,
    pub disk_models: IndexMap<String, VirtualDiskModel>,
    pub servers: Vec<VirtualServer>,
}

impl Topology {
    pub fn server(&self, name: &str) -> Option<&VirtualServer> {
        self.servers.iter().find(|server| server.name == name)
    }

    /// Network carrying the management traffic, if one was identified
    pub fn management_network(&self) -> Option<&VirtualNetwork> {
        self.networks.values().find(|network| network.is_mgmt)
    }
}

/// Virtual network with a single subnet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    pub name: String,
    pub is_mgmt: bool,
    pub external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<VlanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation_pools: Option<Vec<AllocationPool>>,
}

impl VirtualNetwork {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_mgmt: false,
            external: false,
            cidr: None,
            gateway: None,
            vlan: None,
            allocation_pools: None,
        }
    }
}

/// Contiguous DHCP range, serialized as `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPool(pub IpAddr, pub IpAddr);

impl AllocationPool {
    pub fn start(&self) -> IpAddr {
        self.0
    }

    pub fn end(&self) -> IpAddr {
        self.1
    }

    pub fn contains(&self, address: &IpAddr) -> bool {
        self.0 <= *address && *address <= self.1
    }
}

/// Point-to-point router between two non-external networks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Router(pub [String; 2]);

impl Router {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self([a.into(), b.into()])
    }

    pub fn connects(&self, network: &str) -> bool {
        self.0.iter().any(|n| n == network)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualPort {
    /// Device name
    pub name: String,
    pub networks: Vec<String>,
    /// Bond device this port is a member of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualInterfaceModel {
    pub name: String,
    pub ports: Vec<VirtualPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub mountpoint: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualDiskModel {
    pub name: String,
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualServer {
    pub name: String,
    #[serde(default)]
    pub ip_addr: Option<String>,
    pub role: String,
    pub interface_model: String,
    pub disk_model: String,
    pub image: String,
    pub flavor: String,
    pub is_admin: bool,
    pub is_controller: bool,
    pub is_compute: bool,
}

/// Derive the virtual infrastructure for a normalized deployment model
///
/// # Errors
/// - `MissingSection` when `cloud` or `baremetal` is absent
/// - `Network` on malformed CIDR, IP address or netmask literals
/// - `MissingImage`, `MissingFlavor`, `MissingDiskSize` when the catalog has
///   no entry at any fallback level
pub fn generate_topology(model: &DeploymentModel, virt: &VirtConfig) -> TopologyResult<Topology> {
    let cloud = model
        .cloud
        .as_ref()
        .ok_or_else(|| TopologyError::MissingSection("cloud".to_string()))?;
    let baremetal = model
        .baremetal
        .as_ref()
        .ok_or_else(|| TopologyError::MissingSection("baremetal".to_string()))?;
    let clm_cidr = IpCidr::from_subnet_and_netmask(&baremetal.subnet, &baremetal.netmask)?;

    let NetworkPlan {
        networks,
        routers,
        management,
    } = plan_networks(model, &clm_cidr)?;

    let interface_models: IndexMap<String, VirtualInterfaceModel> = model
        .interface_models
        .values()
        .map(|interface_model| {
            let built = build_interface_model(model, interface_model, &networks, management.as_deref());
            (built.name.clone(), built)
        })
        .collect();

    let disk_models = model
        .disk_models
        .values()
        .map(|disk_model| -> TopologyResult<(String, VirtualDiskModel)> {
            let built = build_disk_model(disk_model, virt)?;
            Ok((built.name.clone(), built))
        })
        .collect::<TopologyResult<IndexMap<_, _>>>()?;

    let servers = build_servers(model, virt)?;

    info!(
        "Generated topology for {}: {} networks, {} routers, {} interface models, \
         {} disk models, {} servers",
        cloud.name,
        networks.len(),
        routers.len(),
        interface_models.len(),
        disk_models.len(),
        servers.len(),
    );

    Ok(Topology {
        description: format!("Template for deploying Ardana {}", cloud.name),
        networks,
        routers,
        interface_models,
        disk_models,
        servers,
    })
}
