//! BarStore trait and structured error types.
//!
//! The BarStore trait abstracts over bar sources (Yahoo Finance, CSV fixtures,
//! synthetic data, the Parquet cache) so implementations can be swapped and
//! mocked for tests. The engine consumes the trait and nothing else.

use crate::domain::{Bar, IntradayBar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Intraday bar granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarInterval {
    OneMinute,
    FiveMinute,
    FifteenMinute,
    ThirtyMinute,
    OneHour,
}

impl BarInterval {
    /// Stable tag used in cache keys and provider requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinute => "5m",
            Self::FifteenMinute => "15m",
            Self::ThirtyMinute => "30m",
            Self::OneHour => "1h",
        }
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no bars available for '{symbol}': {detail}")]
    Unavailable { symbol: String, detail: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    Format(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DataError {
    pub fn unavailable(symbol: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unavailable {
            symbol: symbol.into(),
            detail: detail.into(),
        }
    }
}

/// Read-only source of historical bars.
///
/// Contract: returned bars are in ascending timestamp order with no duplicate
/// timestamps, and are deterministic for a given (symbol, range, granularity)
/// key. Implementations are synchronous and potentially slow; the engine
/// fetches each series once per run and callers that want persistence wrap a
/// store in [`CachingStore`](super::cache::CachingStore).
pub trait BarStore: Send + Sync {
    /// Daily bars for `symbol` over `[start, end]` inclusive.
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError>;

    /// Intraday bars for one trading session.
    fn fetch_intraday_bars(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: BarInterval,
    ) -> Result<Vec<IntradayBar>, DataError>;
}

/// Enforce the ordering contract: ascending dates, no duplicates.
pub fn validate_daily_ordering(symbol: &str, bars: &[Bar]) -> Result<(), DataError> {
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(DataError::Format(format!(
                "{symbol}: bars out of order at {} -> {}",
                pair[0].date, pair[1].date
            )));
        }
    }
    Ok(())
}

/// Enforce the ordering contract for intraday bars.
pub fn validate_intraday_ordering(symbol: &str, bars: &[IntradayBar]) -> Result<(), DataError> {
    for pair in bars.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(DataError::Format(format!(
                "{symbol}: intraday bars out of order at {} -> {}",
                pair[0].timestamp, pair[1].timestamp
            )));
        }
    }
    Ok(())
}
