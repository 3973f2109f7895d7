//! Serializable backtest configuration (TOML) with deterministic run ids.
//!
//! Example:
//!
//! ```toml
//! [backtest]
//! start = "2020-01-02"
//! end = "2023-12-29"
//! initial_capital = 100000.0
//! max_positions = 5
//! calendar_symbol = "SPY"
//! universe = ["AAPL", "MSFT", "NVDA"]
//!
//! [scanner]
//! type = "breakout"
//! [scanner.params]
//! lookback = 55
//!
//! [exit]
//! type = "composite_default"
//!
//! [sizer]
//! type = "risk_parity"
//! [sizer.params]
//! risk_fraction = 0.01
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use swinglab_core::components::ComponentSpec;
use swinglab_core::engine::{ConfigError, EngineConfig};
use thiserror::Error;

/// A deterministic, content-addressed run identifier.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// The `[backtest]` section: capital, dates, universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub initial_capital: f64,
    pub max_positions: usize,
    #[serde(default = "default_calendar_symbol")]
    pub calendar_symbol: String,
    pub universe: Vec<String>,
    #[serde(default = "default_warmup_days")]
    pub warmup_days: i64,
    /// Consecutive-fault budget; omit for the default, 0 disables aborting.
    #[serde(default)]
    pub max_consecutive_faults: Option<usize>,
}

fn default_calendar_symbol() -> String {
    "SPY".to_string()
}

fn default_warmup_days() -> i64 {
    120
}

/// Full run configuration: the backtest section plus the three component specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub scanner: ComponentSpec,
    pub exit: ComponentSpec,
    pub sizer: ComponentSpec,
}

impl BacktestConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigFileError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.to_engine_config().validate()?;
        Ok(config)
    }

    /// Translate into the engine's config type.
    pub fn to_engine_config(&self) -> EngineConfig {
        let fault_budget = match self.backtest.max_consecutive_faults {
            Some(0) => None,
            Some(n) => Some(n),
            None => Some(20),
        };
        EngineConfig::new(
            self.backtest.initial_capital,
            self.backtest.max_positions,
            self.backtest.start,
            self.backtest.end,
        )
        .with_calendar_symbol(self.backtest.calendar_symbol.clone())
        .with_warmup_days(self.backtest.warmup_days)
        .with_fault_budget(fault_budget)
    }

    /// Deterministic hash id for this configuration. Two identical configs
    /// share a RunId, which is what makes run artifacts diffable and cacheable.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("BacktestConfig serializes");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// A short human-friendly label: scanner/exit/sizer plus the id prefix.
    pub fn label(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.scanner.kind,
            self.exit.kind,
            self.sizer.kind,
            &self.run_id()[..8]
        )
    }
}
