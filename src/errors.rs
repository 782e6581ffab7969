// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology generation

use thiserror::Error;

use crate::domain::NetworkError;

/// Errors that terminate a topology generation run
///
/// Dangling references and inconsistent entities are not errors: they are
/// resolved locally by pruning. Only conditions that make the generated
/// topology meaningless end up here.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Input document could not be read into the model types
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Input document is not shaped like a deployment model
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Required top-level section is absent
    #[error("Missing required section: {0}")]
    MissingSection(String),

    /// Malformed CIDR, IP address or netmask literal
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// No image configured for a server at any fallback level
    #[error("No image configured for server {server} (distro {distro})")]
    MissingImage { server: String, distro: String },

    /// No flavor configured for a server, explicitly or by role class
    #[error("No flavor configured for server {server}")]
    MissingFlavor { server: String },

    /// No size configured for a volume at any fallback level
    #[error("No disk size configured for volume {volume} of disk model {disk_model}")]
    MissingDiskSize { disk_model: String, volume: String },

    /// Static addresses leave no free range in the management network
    #[error("Allocation pool exhausted for management network {0}")]
    AllocationPoolExhausted(String),
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        TopologyError::Deserialization(err.to_string())
    }
}
