//! Scan configuration loaded from TOML.
//!
//! Every section is optional; missing sections and fields take the
//! reference defaults.
//!
//! ```toml
//! [filters]
//! price_min = 10.0
//! price_max = 60.0
//!
//! [scan]
//! sensitivity = 4
//! mode = "breakout"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::MarketContext;
use crate::patterns::PatternConfig;
use crate::plan::RiskParams;
use crate::setup::{Filters, NearMissRules, ScanMode, Sensitivity, SensitivityTable, SetupClassifier};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub sensitivity: Sensitivity,
    pub mode: ScanMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub window: usize,
    pub num_levels: usize,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            window: 10,
            num_levels: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapSettings {
    pub min_gap_pct: f64,
    pub lookback: usize,
}

impl Default for GapSettings {
    fn default() -> Self {
        Self {
            min_gap_pct: 2.0,
            lookback: 60,
        }
    }
}

/// Worker pool and batching for universe scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    pub workers: usize,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    /// Stop scanning new batches once this many records are collected.
    pub max_results: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            workers: 8,
            batch_size: 50,
            batch_pause_ms: 250,
            max_results: 200,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub filters: Filters,
    pub scan: ScanSettings,
    pub sensitivity: SensitivityTable,
    pub near_miss: NearMissRules,
    pub risk: RiskParams,
    pub levels: LevelSettings,
    pub gaps: GapSettings,
    pub patterns: PatternConfig,
    pub runner: RunnerSettings,
}

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.filters;
        if !(f.price_min >= 0.0 && f.price_min <= f.price_max) {
            return Err(ConfigError::Invalid(format!(
                "price range [{}, {}] is empty",
                f.price_min, f.price_max
            )));
        }
        if !(f.min_volume >= 0.0) {
            return Err(ConfigError::Invalid("min_volume must be >= 0".into()));
        }
        if !self.sensitivity.is_monotonic() {
            return Err(ConfigError::Invalid(
                "sensitivity rows must loosen from level 1 to level 5".into(),
            ));
        }
        let r = &self.risk;
        if !(r.stop_atr_mult > 0.0 && r.rr_mult > 0.0) {
            return Err(ConfigError::Invalid(
                "stop_atr_mult and rr_mult must be positive".into(),
            ));
        }
        if !(r.risk_pct > 0.0 && r.risk_pct <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "risk_pct {} outside (0, 100]",
                r.risk_pct
            )));
        }
        if self.levels.window == 0 || self.gaps.lookback == 0 {
            return Err(ConfigError::Invalid("windows must be positive".into()));
        }
        if self.runner.workers == 0 || self.runner.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "workers and batch_size must be positive".into(),
            ));
        }
        if self.runner.max_results == 0 {
            return Err(ConfigError::Invalid("max_results must be positive".into()));
        }
        Ok(())
    }

    /// Classifier for this configuration under the given market context.
    pub fn classifier(&self, market: &MarketContext) -> SetupClassifier {
        SetupClassifier::new(
            &self.sensitivity,
            self.scan.sensitivity,
            self.scan.mode,
            market.bias,
        )
        .with_filters(self.filters.clone())
        .with_near_miss(self.near_miss.clone())
    }
}
