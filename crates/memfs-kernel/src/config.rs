//! Engine configuration.
//!
//! Read once at construction. Usually built in code with the `with_*`
//! helpers, or loaded from a RON file:
//!
//! ```ron
//! (
//!     case_insensitive: true,
//!     max_file_nodes: 4096,
//!     max_file_size: 67108864,
//!     slowio_max_delay_ms: 10,
//!     slowio_percent_delay: 25,
//! )
//! ```
//!
//! Omitted fields take their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slowio::SlowIoConfig;

/// Errors loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemFsConfig {
    /// Compare paths with case-insensitive ordinal ordering.
    pub case_insensitive: bool,
    /// Ceiling on the number of nodes, root included.
    pub max_file_nodes: usize,
    /// Ceiling on any single node's allocation size.
    pub max_file_size: u64,
    pub sector_size: u32,
    pub sectors_per_allocation_unit: u32,
    pub volume_label: String,
    /// Opaque security descriptor given to the root directory.
    pub root_security: Vec<u8>,
    /// 0 disables deferred completion.
    pub slowio_max_delay_ms: u64,
    /// Chance in percent that a read/write/readdir is deferred.
    pub slowio_percent_delay: u8,
    /// Right shift applied to the random delay; larger values make long
    /// delays rarer.
    pub slowio_rarefy_delay: u32,
}

impl Default for MemFsConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            max_file_nodes: 1024,
            max_file_size: 16 * 1024 * 1024,
            sector_size: 512,
            sectors_per_allocation_unit: 1,
            volume_label: "MEMFS".to_string(),
            root_security: Vec::new(),
            slowio_max_delay_ms: 0,
            slowio_percent_delay: 0,
            slowio_rarefy_delay: 0,
        }
    }
}

impl MemFsConfig {
    /// Parse from RON text and validate.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        tracing::info!(path = %path.display(), "loaded memfs config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_nodes == 0 {
            return Err(ConfigError::Invalid(
                "max_file_nodes must leave room for the root".into(),
            ));
        }
        if self.sector_size == 0 || self.sectors_per_allocation_unit == 0 {
            return Err(ConfigError::Invalid(
                "sector_size and sectors_per_allocation_unit must be non-zero".into(),
            ));
        }
        if self.slowio_percent_delay > 100 {
            return Err(ConfigError::Invalid(format!(
                "slowio_percent_delay is {} (max 100)",
                self.slowio_percent_delay
            )));
        }
        Ok(())
    }

    /// Rounding granularity for allocation sizes.
    pub fn allocation_unit(&self) -> u64 {
        u64::from(self.sector_size) * u64::from(self.sectors_per_allocation_unit)
    }

    pub fn slowio(&self) -> SlowIoConfig {
        SlowIoConfig {
            max_delay: Duration::from_millis(self.slowio_max_delay_ms),
            percent_delay: self.slowio_percent_delay,
            rarefy_delay: self.slowio_rarefy_delay,
        }
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_max_file_nodes(mut self, max_file_nodes: usize) -> Self {
        self.max_file_nodes = max_file_nodes;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_sector_size(mut self, sector_size: u32) -> Self {
        self.sector_size = sector_size;
        self
    }

    pub fn with_root_security(mut self, security: impl Into<Vec<u8>>) -> Self {
        self.root_security = security.into();
        self
    }

    pub fn with_slowio(mut self, max_delay_ms: u64, percent_delay: u8, rarefy_delay: u32) -> Self {
        self.slowio_max_delay_ms = max_delay_ms;
        self.slowio_percent_delay = percent_delay;
        self.slowio_rarefy_delay = rarefy_delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = MemFsConfig::default();
        config.validate().unwrap();
        assert_eq!(config.allocation_unit(), 512);
        assert!(!config.case_insensitive);
    }

    #[test]
    fn test_from_ron_partial() {
        let config = MemFsConfig::from_ron_str(
            "(case_insensitive: true, max_file_nodes: 8, sectors_per_allocation_unit: 8)",
        )
        .unwrap();
        assert!(config.case_insensitive);
        assert_eq!(config.max_file_nodes, 8);
        assert_eq!(config.allocation_unit(), 4096);
        assert_eq!(config.max_file_size, 16 * 1024 * 1024);
    }

    #[test]
    fn test_from_ron_rejects_bad_percent() {
        let err = MemFsConfig::from_ron_str("(slowio_percent_delay: 101)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_ron_parse_error() {
        let err = MemFsConfig::from_ron_str("(max_file_nodes: \"lots\")").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(volume_label: \"SCRATCH\", slowio_max_delay_ms: 5)").unwrap();

        let config = MemFsConfig::load(file.path()).unwrap();
        assert_eq!(config.volume_label, "SCRATCH");
        assert_eq!(config.slowio().max_delay, Duration::from_millis(5));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MemFsConfig::load(dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_zero_sector_size_rejected() {
        let config = MemFsConfig::default().with_sector_size(0);
        assert!(config.validate().is_err());
    }
}
