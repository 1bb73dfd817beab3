//! Configuration system for strait.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $STRAIT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/strait/config.toml
//!   3. ~/.config/strait/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StraitConfig {
    pub bridge: BridgeConfig,
    pub source: SourceConfig,
}

/// Queue capacity and backpressure thresholds.
///
/// The two-threshold design avoids pause/resume oscillation at a single
/// boundary value: the producer pauses at `high_water` and resumes only
/// once the sink drains occupancy down to `low_water`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Max chunks buffered. Pushes beyond this are rejected.
    pub capacity: usize,
    /// Occupancy at which the producer is asked to pause.
    pub high_water: usize,
    /// Occupancy at which a paused producer is resumed.
    pub low_water: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Bytes read from a file per chunk.
    pub read_chunk_bytes: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            high_water: 48,
            low_water: 16,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            read_chunk_bytes: 16 * 1024,
        }
    }
}

impl BridgeConfig {
    /// Check the watermark invariant: 0 < low_water < high_water <= capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be > 0".into()));
        }
        if self.low_water == 0 || self.low_water >= self.high_water {
            return Err(ConfigError::Invalid(format!(
                "low_water {} must be > 0 and < high_water {}",
                self.low_water, self.high_water
            )));
        }
        if self.high_water > self.capacity {
            return Err(ConfigError::Invalid(format!(
                "high_water {} exceeds capacity {}",
                self.high_water, self.capacity
            )));
        }
        Ok(())
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("strait")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl StraitConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            StraitConfig::default()
        };
        config.apply_env_overrides();
        config.bridge.validate()?;
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("STRAIT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&StraitConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply STRAIT_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("STRAIT_BRIDGE__CAPACITY") {
            if let Ok(n) = v.parse() {
                self.bridge.capacity = n;
            }
        }
        if let Ok(v) = std::env::var("STRAIT_BRIDGE__HIGH_WATER") {
            if let Ok(n) = v.parse() {
                self.bridge.high_water = n;
            }
        }
        if let Ok(v) = std::env::var("STRAIT_BRIDGE__LOW_WATER") {
            if let Ok(n) = v.parse() {
                self.bridge.low_water = n;
            }
        }
        if let Ok(v) = std::env::var("STRAIT_SOURCE__READ_CHUNK_BYTES") {
            if let Ok(n) = v.parse() {
                self.source.read_chunk_bytes = n;
            }
        }
    }
}
