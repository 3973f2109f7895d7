//! Engine configuration, validation, and the cancellation token.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Invalid construction parameters. Raised by `validate()` before the day loop
/// starts — never mid-run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("starting capital must be positive, got {0}")]
    NonPositiveCapital(f64),
    #[error("max positions must be at least 1")]
    ZeroMaxPositions,
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("calendar symbol must not be empty")]
    EmptyCalendarSymbol,
}

/// Configuration for a single backtest run. Every field is required at
/// construction; there are no hidden defaults inside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub starting_capital: f64,
    pub max_positions: usize,
    /// First simulated day (inclusive).
    pub start: NaiveDate,
    /// Last simulated day (inclusive).
    pub end: NaiveDate,
    /// Symbol whose daily bars define the trading calendar.
    pub calendar_symbol: String,
    /// Calendar days of pre-start history fetched per symbol, so exit policies
    /// with lookback windows are warm from the first day.
    pub warmup_days: i64,
    /// Abort the run after this many consecutive component faults.
    /// `None` disables the budget: faults are recorded but never fatal.
    pub max_consecutive_faults: Option<usize>,
}

impl EngineConfig {
    pub fn new(starting_capital: f64, max_positions: usize, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            starting_capital,
            max_positions,
            start,
            end,
            calendar_symbol: "SPY".to_string(),
            warmup_days: 120,
            max_consecutive_faults: Some(20),
        }
    }

    pub fn with_calendar_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.calendar_symbol = symbol.into();
        self
    }

    pub fn with_warmup_days(mut self, days: i64) -> Self {
        self.warmup_days = days;
        self
    }

    pub fn with_fault_budget(mut self, budget: Option<usize>) -> Self {
        self.max_consecutive_faults = budget;
        self
    }

    /// Fail fast on invalid parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.starting_capital));
        }
        if self.max_positions == 0 {
            return Err(ConfigError::ZeroMaxPositions);
        }
        if self.start > self.end {
            return Err(ConfigError::InvertedDateRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.calendar_symbol.is_empty() {
            return Err(ConfigError::EmptyCalendarSymbol);
        }
        Ok(())
    }
}

/// Coarse-grained cancellation: checked at the top of each simulated day.
/// A cancelled run stops the day loop and returns partial results; no
/// partial-day state is ever exposed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        )
    }

    #[test]
    fn valid_config_passes() {
        let (start, end) = dates();
        assert!(EngineConfig::new(100_000.0, 5, start, end).validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_capital() {
        let (start, end) = dates();
        let err = EngineConfig::new(0.0, 5, start, end).validate().unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveCapital(_)));
    }

    #[test]
    fn rejects_zero_max_positions() {
        let (start, end) = dates();
        let err = EngineConfig::new(1000.0, 0, start, end).validate().unwrap_err();
        assert_eq!(err, ConfigError::ZeroMaxPositions);
    }

    #[test]
    fn rejects_inverted_range() {
        let (start, end) = dates();
        let err = EngineConfig::new(1000.0, 5, end, start).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvertedDateRange { .. }));
    }

    #[test]
    fn cancel_token_flips_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        // Clones share the flag.
        let clone = token.clone();
        assert!(clone.is_cancelled());
    }
}
