//! Dashboard configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock SPY dashboard.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use arfund_core::lock::{LockParams, LockParamsError};
use arfund_core::{ParamsError, StrategyParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("history_years must be between 1 and 30 (got {0})")]
    HistoryYears(u32),

    #[error("invalid strategy parameters: {0}")]
    Strategy(#[from] ParamsError),

    #[error("invalid recommendation parameters: {0}")]
    Recommendation(#[from] LockParamsError),
}

/// Which symbol, how much history, and where the weekly lock lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSection {
    pub symbol: String,
    pub history_years: u32,
    pub cache_file: PathBuf,
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            symbol: "SPY".into(),
            history_years: 5,
            cache_file: PathBuf::from("current_week_trade.json"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dashboard: DashboardSection,
    pub strategy: StrategyParams,
    pub recommendation: LockParams,
}

impl DashboardConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if !(1..=30).contains(&self.dashboard.history_years) {
            return Err(ConfigError::HistoryYears(self.dashboard.history_years));
        }
        self.strategy.validate()?;
        self.recommendation.validate()?;
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        self.dashboard.symbol.trim()
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
