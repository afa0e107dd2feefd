//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable overrides for the data directory and position cap.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::beta::BetaConfig;
use crate::crowding::CrowdingConfig;
use crate::kelly::KellyConfig;
use crate::pairs::PairConfig;
use crate::regime::RegimeConfig;
use crate::skill::SkillConfig;
use crate::vpin::VpinConfig;

/// Overrides `data.dir`
pub const ENV_DATA_DIR: &str = "QUANT_SIGNALS_DATA_DIR";
/// Overrides `kelly.max_position`
pub const ENV_MAX_POSITION: &str = "QUANT_SIGNALS_MAX_POSITION";

/// Main configuration structure
///
/// Every section is optional in the JSON file and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub regime: RegimeConfig,
    pub beta: BetaConfig,
    pub pairs: PairConfig,
    pub vpin: VpinConfig,
    pub kelly: KellyConfig,
    pub skill: SkillConfig,
    pub crowding: CrowdingConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults
    ///
    /// Environment overrides apply either way.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        tracing::debug!("Config {} not found, using defaults", path.display());
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            self.data.dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var(ENV_MAX_POSITION) {
            self.kelly.max_position = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number, got '{}'", ENV_MAX_POSITION, raw))?;
        }
        Ok(())
    }
}

/// Where series CSV files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}
