//! Engine configuration
//!
//! Loaded from JSON. Every field has a default, so an empty object is a valid
//! configuration.

use crate::error::{BenchError, Result};
use crate::strategy::PieceOrder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the asset extracted by `init`
pub const DEFAULT_ASSET_NAME: &str = "random_content.txt";

/// File name the asset is extracted to inside the data directory
pub const DEFAULT_DATA_FILE_NAME: &str = "local_content.txt";

/// Piece count used when a caller does not pass one
pub const DEFAULT_PIECES: u32 = 10;

/// Tag attached to every log line
pub const DEFAULT_LOG_TAG: &str = "MainActivity";

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "ARB_CONFIG";

/// Data directory used when the caller does not name one
///
/// `<local data dir>/asset-read-bench`, or `None` on platforms without one.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("asset-read-bench"))
}

/// Benchmark engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Asset to extract and to read in asset strategies
    pub asset_name: String,
    /// Extraction target, relative to the data directory
    pub data_file_name: String,
    /// Piece count for chunked strategies when none is given
    pub default_pieces: u32,
    /// Order in which chunked strategies visit pieces
    pub piece_order: PieceOrder,
    /// Compare the destination buffer against the source after each run
    pub verify: bool,
    /// Log tag
    pub log_tag: String,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            asset_name: DEFAULT_ASSET_NAME.to_string(),
            data_file_name: DEFAULT_DATA_FILE_NAME.to_string(),
            default_pieces: DEFAULT_PIECES,
            piece_order: PieceOrder::Sequential,
            verify: false,
            log_tag: DEFAULT_LOG_TAG.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl BenchConfig {
    /// Parses a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BenchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Reads the file named by `ARB_CONFIG`, or returns the defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Serializes to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| BenchError::Config(e.to_string()))
    }

    /// Checks field values
    pub fn validate(&self) -> Result<()> {
        if self.default_pieces == 0 {
            return Err(BenchError::Config("default_pieces must be >= 1".to_string()));
        }
        if self.asset_name.is_empty() {
            return Err(BenchError::Config("asset_name must not be empty".to_string()));
        }
        if self.data_file_name.is_empty() || self.data_file_name.contains(['/', '\\']) {
            return Err(BenchError::Config(format!(
                "data_file_name must be a bare file name, got {:?}",
                self.data_file_name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.asset_name, "random_content.txt");
        assert_eq!(config.data_file_name, "local_content.txt");
        assert_eq!(config.default_pieces, 10);
        assert_eq!(config.piece_order, PieceOrder::Sequential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(BenchConfig::from_json("{}").unwrap(), BenchConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config =
            BenchConfig::from_json(r#"{"default_pieces": 3, "piece_order": "shuffled"}"#).unwrap();
        assert_eq!(config.default_pieces, 3);
        assert_eq!(config.piece_order, PieceOrder::Shuffled);
        assert_eq!(config.asset_name, DEFAULT_ASSET_NAME);
    }

    #[test]
    fn test_invalid_values() {
        assert!(BenchConfig::from_json(r#"{"default_pieces": 0}"#).is_err());
        assert!(BenchConfig::from_json(r#"{"asset_name": ""}"#).is_err());
        assert!(BenchConfig::from_json(r#"{"data_file_name": "../x"}"#).is_err());
        assert!(BenchConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");

        let config = BenchConfig {
            verify: true,
            ..Default::default()
        };
        std::fs::write(&path, config.to_json().unwrap()).unwrap();
        assert_eq!(BenchConfig::from_file(&path).unwrap(), config);

        let missing = BenchConfig::from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(BenchError::NotFound(_))));
    }

    #[test]
    fn test_default_data_dir() {
        if let Some(dir) = default_data_dir() {
            assert!(dir.ends_with("asset-read-bench"));
        }
    }
}
