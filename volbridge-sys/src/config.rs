// SPDX-License-Identifier: GPL-3.0-only

//! Bridge configuration, read from TOML.
//!
//! ```toml
//! [capture]
//! level = 4
//!
//! [discovery]
//! source = "parted"
//! parted = "parted"
//! lsblk = "lsblk"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::{CAPTURE_LEVEL, CaptureSink, DiagnosticQueue};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which tool describes a disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    /// Block geometry and partition offsets (`parted -sj ... unit MiB print`)
    #[default]
    Parted,
    /// Media flags and mount points (`lsblk -J`)
    Lsblk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Engine severity the capture filter keeps
    pub level: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            level: CAPTURE_LEVEL,
        }
    }
}

impl CaptureConfig {
    pub fn sink(&self, queue: DiagnosticQueue) -> CaptureSink {
        CaptureSink::with_level(queue, self.level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub source: DiscoverySource,
    /// parted executable (name looked up in PATH, or absolute path)
    pub parted: String,
    /// lsblk executable
    pub lsblk: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            source: DiscoverySource::default(),
            parted: "parted".to_string(),
            lsblk: "lsblk".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub capture: CaptureConfig,
    pub discovery: DiscoveryConfig,
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // liblvm2cmd levels run from fatal (2) to debug (7).
        if !(0..=7).contains(&self.capture.level) {
            return Err(ConfigError::Invalid(format!(
                "capture.level must be between 0 and 7, got {}",
                self.capture.level
            )));
        }

        if self.discovery.parted.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.parted must not be empty".to_string(),
            ));
        }

        if self.discovery.lsblk.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.lsblk must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.capture.level, CAPTURE_LEVEL);
        assert_eq!(config.discovery.source, DiscoverySource::Parted);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [discovery]
            source = "lsblk"
            lsblk = "/usr/bin/lsblk"
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.source, DiscoverySource::Lsblk);
        assert_eq!(config.discovery.lsblk, "/usr/bin/lsblk");
        assert_eq!(config.discovery.parted, "parted");
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[test]
    fn rejects_out_of_range_level() {
        let error = BridgeConfig::from_toml_str("[capture]\nlevel = 9\n").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_program() {
        let error = BridgeConfig::from_toml_str("[discovery]\nparted = \"\"\n").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_source() {
        let error = BridgeConfig::from_toml_str("[discovery]\nsource = \"udev\"\n").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn configured_level_drives_sink() {
        let config = BridgeConfig::from_toml_str("[capture]\nlevel = 3\n").unwrap();
        let sink = config.capture.sink(DiagnosticQueue::new());
        assert!(sink.accepts(3));
        assert!(!sink.accepts(4));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = BridgeConfig::load(Path::new("/nonexistent/volbridge.toml")).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/volbridge.toml"));
    }
}
