//! Pullback scanner: uptrending symbols dipping to a fast moving average.

use super::Scanner;
use crate::components::PolicyError;
use crate::data::{BarStore, DataError};
use crate::domain::Candidate;
use crate::indicators::sma;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

/// Signals when a symbol in an uptrend (close above the slow SMA) pulls back to
/// within `proximity_pct` of the fast SMA and closes back above it. Score is
/// trend strength: percent distance of close above the slow SMA.
pub struct PullbackScanner {
    store: Arc<dyn BarStore>,
    universe: Vec<String>,
    fast_period: usize,
    slow_period: usize,
    proximity_pct: f64,
    stop_pct: f64,
}

impl PullbackScanner {
    pub fn new(
        store: Arc<dyn BarStore>,
        universe: Vec<String>,
        fast_period: usize,
        slow_period: usize,
    ) -> Self {
        Self {
            store,
            universe,
            fast_period,
            slow_period,
            proximity_pct: 1.5,
            stop_pct: 5.0,
        }
    }

    pub fn with_proximity_pct(mut self, pct: f64) -> Self {
        self.proximity_pct = pct;
        self
    }

    pub fn with_stop_pct(mut self, pct: f64) -> Self {
        self.stop_pct = pct;
        self
    }

    fn history_start(&self, date: NaiveDate) -> NaiveDate {
        let trading_days = self.slow_period + 5;
        date - Duration::days((trading_days as f64 * 1.6).ceil() as i64)
    }
}

impl Scanner for PullbackScanner {
    fn strategy_name(&self) -> &str {
        "pullback"
    }

    fn scan(&self, date: NaiveDate) -> Result<Vec<Candidate>, PolicyError> {
        let mut candidates = Vec::new();

        for symbol in &self.universe {
            let bars = match self.store.fetch_daily_bars(symbol, self.history_start(date), date) {
                Ok(bars) => bars,
                Err(DataError::Unavailable { .. }) | Err(DataError::SymbolNotFound { .. }) => {
                    continue
                }
                Err(e) => return Err(e.into()),
            };

            let Some(today) = bars.last().filter(|b| b.date == date) else {
                continue;
            };
            let (Some(fast), Some(slow)) =
                (sma(&bars, self.fast_period), sma(&bars, self.slow_period))
            else {
                continue;
            };

            // Uptrend, dip touched the fast MA's neighborhood, close held above it.
            let in_uptrend = today.close > slow && fast > slow;
            let dipped = today.low <= fast * (1.0 + self.proximity_pct / 100.0);
            let reclaimed = today.close > fast;
            if !(in_uptrend && dipped && reclaimed) {
                continue;
            }

            let trend_strength = (today.close - slow) / slow * 100.0;
            let stop = today.close * (1.0 - self.stop_pct / 100.0);
            candidates.push(
                Candidate::new(symbol.clone(), date, trend_strength)
                    .with_prices(today.close, stop)
                    .with_metadata("fast_sma", format!("{fast:.4}"))
                    .with_metadata("slow_sma", format!("{slow:.4}")),
            );
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStore;
    use crate::domain::Bar;

    /// Rising series that dips to its fast SMA on the last bar.
    fn uptrend_with_dip() -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut bars: Vec<Bar> = (0..60)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.5;
                Bar {
                    date: base + Duration::days(i),
                    open: close - 0.2,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 10_000,
                }
            })
            .collect();
        // Final bar: low tags the fast MA region, close recovers above it.
        let last = bars.last_mut().unwrap();
        last.low = last.close - 3.5;
        last.close -= 0.5;
        bars
    }

    #[test]
    fn signals_on_held_pullback() {
        let store = Arc::new(MemoryStore::new().with_daily("MSFT", uptrend_with_dip()));
        let scanner = PullbackScanner::new(store, vec!["MSFT".into()], 10, 30);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let candidates = scanner.scan(date).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].score > 0.0);
        assert!(candidates[0].stop_price < candidates[0].entry_price);
    }

    #[test]
    fn no_signal_without_dip() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.5;
                Bar {
                    date: base + Duration::days(i),
                    open: close - 0.2,
                    high: close + 0.5,
                    low: close - 0.3, // never reaches the fast MA
                    close,
                    volume: 10_000,
                }
            })
            .collect();
        let store = Arc::new(MemoryStore::new().with_daily("MSFT", bars));
        let scanner = PullbackScanner::new(store, vec!["MSFT".into()], 10, 30).with_proximity_pct(0.1);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert!(scanner.scan(date).unwrap().is_empty());
    }
}
