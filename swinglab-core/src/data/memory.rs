//! In-memory bar store for tests and pre-loaded runs.

use super::store::{validate_daily_ordering, BarInterval, BarStore, DataError};
use crate::domain::{Bar, IntradayBar};
use chrono::NaiveDate;
use std::collections::HashMap;

/// A BarStore backed by maps. Used heavily by tests and by callers that have
/// already loaded their data through some other channel.
#[derive(Debug, Default)]
pub struct MemoryStore {
    daily: HashMap<String, Vec<Bar>>,
    intraday: HashMap<(String, NaiveDate, BarInterval), Vec<IntradayBar>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a daily series. Panics if the series violates the ordering
    /// contract — fixture bugs should fail loudly.
    pub fn with_daily(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        let symbol = symbol.into();
        validate_daily_ordering(&symbol, &bars).expect("fixture series must be ordered");
        self.daily.insert(symbol, bars);
        self
    }

    pub fn with_intraday(
        mut self,
        symbol: impl Into<String>,
        date: NaiveDate,
        interval: BarInterval,
        bars: Vec<IntradayBar>,
    ) -> Self {
        self.intraday.insert((symbol.into(), date, interval), bars);
        self
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut syms: Vec<&str> = self.daily.keys().map(|s| s.as_str()).collect();
        syms.sort_unstable();
        syms
    }
}

impl BarStore for MemoryStore {
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let series = self
            .daily
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        let bars: Vec<Bar> = series
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        if bars.is_empty() {
            return Err(DataError::unavailable(
                symbol,
                format!("no bars in {start}..{end}"),
            ));
        }
        Ok(bars)
    }

    fn fetch_intraday_bars(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: BarInterval,
    ) -> Result<Vec<IntradayBar>, DataError> {
        self.intraday
            .get(&(symbol.to_string(), date, interval))
            .cloned()
            .ok_or_else(|| DataError::unavailable(symbol, format!("no {0} session for {date}", interval.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(d: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn range_filtering() {
        let store = MemoryStore::new().with_daily("SPY", vec![bar(2, 100.0), bar(3, 101.0), bar(4, 102.0)]);
        let bars = store
            .fetch_daily_bars(
                "SPY",
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            )
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 101.0);
    }

    #[test]
    fn unknown_symbol_errors() {
        let store = MemoryStore::new();
        let err = store
            .fetch_daily_bars(
                "NOPE",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn empty_range_is_unavailable() {
        let store = MemoryStore::new().with_daily("SPY", vec![bar(2, 100.0)]);
        let err = store
            .fetch_daily_bars(
                "SPY",
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DataError::Unavailable { .. }));
    }
}
