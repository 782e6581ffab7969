// Copyright (c) 2025 - Cowboy AI, Inc.
//! Virtual infrastructure topology generation for declarative cloud deployments
//!
//! A deployment document (control planes, server roles, networks, disk and
//! interface layouts) is normalized into a linked, pruned graph, then walked
//! to derive the networks, routers, ports, volumes and virtual machines that
//! can host it.
//!
//! # Stages
//!
//! - [`normalize`] - Model Normalizer: linking, pruning, neutron overlay
//! - [`topology`] - Topology Generator
//! - [`nic_mapping`] - NIC-Mapping Synthesizer
//! - [`pipeline`] - all of the above over a raw document

pub mod domain;
pub mod errors;
pub mod nic_mapping;
pub mod normalize;
pub mod pipeline;
pub mod topology;
pub mod virt_config;

// Re-export commonly used types
pub use domain::{DeploymentModel, IpCidr, Link, NetworkError, VlanId};
pub use errors::{TopologyError, TopologyResult};
pub use nic_mapping::synthesize_nic_mappings;
pub use normalize::{normalize, normalize_model};
pub use pipeline::{generate_heat_model, GeneratedModel};
pub use topology::{generate_topology, Topology};
pub use virt_config::VirtConfig;
