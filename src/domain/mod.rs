// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Domain Models
//!
//! Value objects and the normalized object graph of a declarative cloud
//! deployment model.
//!
//! # Value Objects with Invariants
//!
//! - [`IpCidr`] - IPv4/IPv6 network in CIDR notation
//! - [`VlanId`] - IEEE 802.1Q VLAN ID (1-4094)
//!
//! # Entities
//!
//! - [`DeploymentModel`] - arena of all entity maps, keyed by natural identifier
//! - [`Link`] / [`Route`] - forward references, resolved or not
//! - [`BackRefs`] - reverse references used for pruning

pub mod invariants;
pub mod model;
pub mod network;

pub use invariants::{validate_referential_closure, ValidationError, ValidationResult};
pub use model::{
    BackRefs, BaremetalSubnet, BondData, CloudSettings, ConfigurationData, ControlPlane,
    DeploymentModel, Device, DeviceGroup, DiskModel, Entity, FirewallRule, InterfaceModel,
    Keyed, Link, Network, NetworkGroup, NetworkInterface, NetworkTag, NeutronNetwork,
    NicMapping, Provider, RefKind, Route, Server, ServerGroup, ServerRole, ServiceGroup,
    ServiceGroupKind, VolumeGroup,
};
pub use network::{parse_ip, IpCidr, NetworkError, VlanId};
