use crate::engine::SettlementPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssetConfig {
    pub id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OracleConfig {
    pub base_url: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            base_url: "http://127.0.0.1:8645".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Protocol fee as a fraction of the loan's reference value, in basis
    /// points.
    #[serde(default = "default_fee_fraction_bps")]
    pub fee_fraction_bps: u32,
    #[serde(default)]
    pub settlement_policy: SettlementPolicy,
    #[serde(default = "default_callback_deadline_secs")]
    pub callback_deadline_secs: u64,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

fn default_fee_fraction_bps() -> u32 {
    30
}

fn default_callback_deadline_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            fee_fraction_bps: default_fee_fraction_bps(),
            settlement_policy: SettlementPolicy::default(),
            callback_deadline_secs: default_callback_deadline_secs(),
            oracle: OracleConfig::default(),
            assets: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "flashpool", "flashpool")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "flashpool", "flashpool")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
