//! # Configuration
//!
//! Two sources, both read once at startup:
//!
//! 1. **Gate file** (`zerolock.yaml`, optional)
//!    - Migration exclusions, report-all mode, structured events
//!
//! 2. **Process environment** (`SAFETY_ASSURED`, via clap `env` bindings)
//!    - Global override switch handed to the dispatcher
//!
//! Command-line flags take precedence over the gate file.

mod gates;

pub use gates::GatesConfig;

use anyhow::{Context, Result};
use std::path::Path;

/// Default gate file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "zerolock.yaml";

/// Load gate configuration from a YAML file
pub async fn load_gates_config(path: &Path) -> Result<GatesConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: GatesConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    Ok(config)
}

/// Resolve gate configuration: explicit path, else `zerolock.yaml` if present, else defaults
pub async fn resolve_gates_config(explicit: Option<&Path>) -> Result<GatesConfig> {
    match explicit {
        Some(path) => load_gates_config(path).await,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if tokio::fs::try_exists(default_path).await.unwrap_or(false) {
                load_gates_config(default_path).await
            } else {
                Ok(GatesConfig::default())
            }
        }
    }
}
