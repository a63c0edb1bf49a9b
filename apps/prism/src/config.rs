//! # Configuration
//!
//! Optional `prism.toml` with defaults for the command line:
//!
//! ```toml
//! quantum = 0
//!
//! [emit]
//! sample_size = 256
//! closure_ops = ["not"]
//! closure_mode = "graph_closed"
//! ```
//!
//! Command-line flags override every value here.

use prism_core::{ClosureMode, ClosureOp, PrismError, QuantumLevel};
use serde::Deserialize;
use std::path::Path;

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "prism.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrismConfig {
    /// Default quantum level.
    pub quantum: QuantumLevel,
    /// Emission defaults.
    pub emit: EmitConfig,
}

/// Defaults for `prism emit`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitConfig {
    /// Number of datums to sample.
    pub sample_size: u64,
    /// Closure operations attached to every node.
    pub closure_ops: Vec<ClosureOp>,
    /// Closure policy.
    pub closure_mode: ClosureMode,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            sample_size: 256,
            closure_ops: vec![ClosureOp::Not],
            closure_mode: ClosureMode::OneStep,
        }
    }
}

impl PrismConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PrismError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PrismError::Io(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, PrismError> {
        toml::from_str(content)
            .map_err(|e| PrismError::Serialization(format!("Failed to parse config: {}", e)))
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Without one, `prism.toml` in the working
    /// directory is used if present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, PrismError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    tracing::debug!(path = DEFAULT_CONFIG_FILE, "loading config");
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
