//! # Meshatlas Core
//!
//! Shared building blocks for the mesh atlas splitter.
//!
//! This crate provides:
//! - **Config**: Fragment thresholds, axis convention and output naming
//! - **Math**: Footprint rectangles, bounding boxes and the projection contract
//! - **Cancel**: A pre-start cancellation token for queued splits

pub mod cancel;
pub mod math;

pub use cancel::CancelToken;
pub use math::{Aabb3, AxisConvention, Rect2};

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default minimum size (in vertices) below which a cluster is a fragment
pub const DEFAULT_FRAGMENT_FLOOR: usize = 100;

/// Default fraction of the mean cluster size below which a cluster is a fragment
pub const DEFAULT_FRAGMENT_FRACTION: f64 = 0.05;

/// Splitter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplitConfig {
    /// Absolute fragment threshold in vertices
    pub fragment_floor: usize,
    /// Fragment threshold relative to the mean cluster size
    pub fragment_fraction: f64,
    /// How plan space maps onto mesh space
    pub axes: AxisConvention,
    /// Output files are named `<prefix>_<index>` instead of the cell name
    pub name_prefix: Option<String>,
    /// Write per-cell files on the rayon pool
    pub parallel_writes: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            fragment_floor: DEFAULT_FRAGMENT_FLOOR,
            fragment_fraction: DEFAULT_FRAGMENT_FRACTION,
            axes: AxisConvention::default(),
            name_prefix: None,
            parallel_writes: true,
        }
    }
}

impl SplitConfig {
    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded split config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check the config for values the pipeline cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.fragment_fraction.is_finite() || self.fragment_fraction < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fragmentFraction must be a finite, non-negative number (got {})",
                self.fragment_fraction
            )));
        }
        if let Some(prefix) = &self.name_prefix {
            if prefix.is_empty() || prefix.contains(['/', '\\']) {
                return Err(ConfigError::Invalid(format!(
                    "namePrefix must be a non-empty file name component (got '{}')",
                    prefix
                )));
            }
        }
        Ok(())
    }

    /// Output name for a cell, honouring the name prefix
    pub fn output_name(&self, cell_name: &str, index: usize) -> String {
        match &self.name_prefix {
            Some(prefix) => format!("{}_{}", prefix, index),
            None => cell_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SplitConfig::default();
        assert_eq!(config.fragment_floor, 100);
        assert_eq!(config.fragment_fraction, 0.05);
        assert_eq!(config.axes, AxisConvention::ZUpSource);
        assert!(config.parallel_writes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_name() {
        let mut config = SplitConfig::default();
        assert_eq!(config.output_name("crate_small", 3), "crate_small");

        config.name_prefix = Some("crate".to_string());
        assert_eq!(config.output_name("crate_small", 3), "crate_3");
    }

    #[test]
    fn test_partial_json_config() {
        let config: SplitConfig =
            serde_json::from_str(r#"{ "fragmentFloor": 8, "axes": "identity" }"#).unwrap();
        assert_eq!(config.fragment_floor, 8);
        assert_eq!(config.axes, AxisConvention::Identity);
        assert_eq!(config.fragment_fraction, DEFAULT_FRAGMENT_FRACTION);
    }

    #[test]
    fn test_invalid_config() {
        let config = SplitConfig {
            fragment_fraction: -1.0,
            ..SplitConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SplitConfig {
            name_prefix: Some("a/b".to_string()),
            ..SplitConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = std::env::temp_dir().join("meshatlas_core_config_test");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("split.json");

        std::fs::write(&path, r#"{ "namePrefix": "door", "parallelWrites": false }"#).unwrap();
        let config = SplitConfig::from_json_file(&path).unwrap();
        assert_eq!(config.name_prefix.as_deref(), Some("door"));
        assert!(!config.parallel_writes);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
