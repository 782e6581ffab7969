// Copyright (c) 2025 - Cowboy AI, Inc.
//! Combined Pipeline
//!
//! ```text
//! input model ──► normalize ──► generate_topology ──► synthesize_nic_mappings
//!      │                              │                        │
//!      └──────── copy ────────────────┴────────────────────────┴──► GeneratedModel
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::TopologyResult;
use crate::nic_mapping::synthesize_nic_mappings;
use crate::normalize::normalize;
use crate::topology::{generate_topology, Topology};
use crate::virt_config::VirtConfig;

/// Generated topology plus the rewritten deployment document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedModel {
    #[serde(rename = "heat_template")]
    pub topology: Topology,
    pub input_model: Value,
}

/// Run the whole pipeline over a raw deployment document
///
/// The caller's document is never modified; the returned `input_model` is a
/// copy carrying the synthesized NIC mappings.
pub fn generate_heat_model(input_model: &Value, virt: &VirtConfig) -> TopologyResult<GeneratedModel> {
    let model = normalize(input_model)?;
    let topology = generate_topology(&model, virt)?;

    let mut updated = input_model.clone();
    synthesize_nic_mappings(&mut updated, &topology)?;

    info!("Generated model: {}", topology.description);
    Ok(GeneratedModel {
        topology,
        input_model: updated,
    })
}
