// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Generator
//!
//! Reads a deployment document and a virtualization catalog, runs the
//! pipeline and prints `{"heat_template": ..., "input_model": ...}`.
//!
//! Run with: cargo run --bin topology-generator
//!
//! Environment:
//! 1. INPUT_MODEL_PATH - JSON deployment document (required)
//! 2. VIRT_CONFIG_PATH - JSON virtualization catalog (required)
//! 3. OUTPUT_PATH - write the result there instead of stdout (optional)

use anyhow::{Context, Result};
use cim_virt_topology::{generate_heat_model, VirtConfig};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration for the generator
#[derive(Debug, Clone)]
struct GeneratorConfig {
    input_model_path: PathBuf,
    virt_config_path: PathBuf,
    output_path: Option<PathBuf>,
}

impl GeneratorConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let input_model_path = std::env::var("INPUT_MODEL_PATH")
            .context("INPUT_MODEL_PATH not set")?
            .into();
        let virt_config_path = std::env::var("VIRT_CONFIG_PATH")
            .context("VIRT_CONFIG_PATH not set")?
            .into();
        let output_path = std::env::var("OUTPUT_PATH").ok().map(PathBuf::from);

        Ok(Self {
            input_model_path,
            virt_config_path,
            output_path,
        })
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = GeneratorConfig::from_env()?;
    info!("Input model: {}", config.input_model_path.display());
    info!("Virtualization catalog: {}", config.virt_config_path.display());

    let input_model = read_json(&config.input_model_path)?;
    let virt: VirtConfig = serde_json::from_value(read_json(&config.virt_config_path)?)
        .context("Invalid virtualization catalog")?;

    let generated = generate_heat_model(&input_model, &virt).context("Topology generation failed")?;
    let output = serde_json::to_string_pretty(&generated)?;

    match &config.output_path {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{output}"),
    }

    Ok(())
}
