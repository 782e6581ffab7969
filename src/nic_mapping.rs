// Copyright (c) 2025 - Cowboy AI, Inc.
//! NIC-Mapping Synthesizer
//!
//! Virtual machines expose their ports on PCI slots handed out in port
//! order. Each generated interface model gets a matching `HEAT-` prefixed
//! mapping in the deployment document, and every placed server is pointed
//! at the mapping of its interface model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{TopologyError, TopologyResult};
use crate::topology::{Topology, VirtualInterfaceModel};

/// Prefix of synthesized mapping names
pub const NIC_MAPPING_PREFIX: &str = "HEAT-";

/// PCI slot of the first port
pub const FIRST_PORT_SLOT: usize = 0x03;

const SIMPLE_PORT: &str = "simple-port";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PhysicalPort {
    pub logical_name: String,
    #[serde(rename = "type")]
    pub port_type: String,
    pub bus_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneratedNicMapping {
    pub name: String,
    pub physical_ports: Vec<PhysicalPort>,
}

impl GeneratedNicMapping {
    pub fn for_interface_model(interface_model: &VirtualInterfaceModel) -> Self {
        Self {
            name: nic_mapping_name(&interface_model.name),
            physical_ports: interface_model
                .ports
                .iter()
                .enumerate()
                .map(|(index, port)| PhysicalPort {
                    logical_name: port.name.clone(),
                    port_type: SIMPLE_PORT.to_string(),
                    bus_address: bus_address(index),
                })
                .collect(),
        }
    }
}

/// Mapping name for an interface model
pub fn nic_mapping_name(interface_model: &str) -> String {
    format!("{NIC_MAPPING_PREFIX}{interface_model}")
}

/// PCI bus address of the port at `index`
pub fn bus_address(index: usize) -> String {
    format!("0000:00:{:02x}.0", index + FIRST_PORT_SLOT)
}

/// Point placed servers at their synthesized mapping and write the mappings
///
/// Servers the generator skipped are left untouched. A mapping whose name
/// already exists replaces it at the same position; new ones are appended.
pub fn synthesize_nic_mappings(input_model: &mut Value, topology: &Topology) -> TopologyResult<()> {
    let document = input_model.as_object_mut().ok_or_else(|| {
        TopologyError::InvalidDocument("input model must be a mapping".to_string())
    })?;

    let mut rewired = 0;
    if let Some(servers) = document.get_mut("servers").and_then(Value::as_array_mut) {
        for server in servers.iter_mut().filter_map(Value::as_object_mut) {
            let Some(placed) = server
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| topology.server(id))
            else {
                continue;
            };
            server.insert(
                "nic-mapping".to_string(),
                Value::String(nic_mapping_name(&placed.interface_model)),
            );
            rewired += 1;
        }
    }

    let mappings = document
        .entry("nic-mappings")
        .or_insert_with(|| Value::Array(Vec::new()));
    if mappings.is_null() {
        *mappings = Value::Array(Vec::new());
    }
    let mappings = mappings.as_array_mut().ok_or_else(|| {
        TopologyError::InvalidDocument("nic-mappings must be a list".to_string())
    })?;

    for interface_model in topology.interface_models.values() {
        let mapping = GeneratedNicMapping::for_interface_model(interface_model);
        let position = mappings
            .iter()
            .position(|existing| existing.get("name").and_then(Value::as_str) == Some(mapping.name.as_str()));
        let value = serde_json::to_value(&mapping)?;
        match position {
            Some(index) => {
                debug!("Replacing NIC mapping {}", mapping.name);
                mappings[index] = value;
            }
            None => {
                debug!("Adding NIC mapping {}", mapping.name);
                mappings.push(value);
            }
        }
    }

    info!(
        "Synthesized {} NIC mappings for {} servers",
        topology.interface_models.len(),
        rewired
    );
    Ok(())
}
