//! Breakout scanner: close above the prior N-day high.

use super::Scanner;
use crate::components::PolicyError;
use crate::data::{BarStore, DataError};
use crate::domain::Candidate;
use crate::indicators::{atr, highest_high};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

/// Signals when a symbol closes above its highest high of the prior `lookback`
/// trading days. Score is the breakout margin as a percentage of the prior
/// high, so stronger breakouts are admitted first under capacity pressure.
pub struct BreakoutScanner {
    store: Arc<dyn BarStore>,
    universe: Vec<String>,
    lookback: usize,
    /// Initial stop distance in ATR multiples below the entry close.
    stop_atr_mult: f64,
    atr_period: usize,
    min_volume: u64,
}

impl BreakoutScanner {
    pub fn new(store: Arc<dyn BarStore>, universe: Vec<String>, lookback: usize) -> Self {
        Self {
            store,
            universe,
            lookback,
            stop_atr_mult: 2.0,
            atr_period: 14,
            min_volume: 0,
        }
    }

    pub fn with_stop_atr_mult(mut self, mult: f64) -> Self {
        self.stop_atr_mult = mult;
        self
    }

    pub fn with_min_volume(mut self, min_volume: u64) -> Self {
        self.min_volume = min_volume;
        self
    }

    /// History window needed to evaluate one day: lookback plus ATR warmup,
    /// padded from trading days to calendar days.
    fn history_start(&self, date: NaiveDate) -> NaiveDate {
        let trading_days = self.lookback + self.atr_period + 5;
        date - Duration::days((trading_days as f64 * 1.6).ceil() as i64)
    }
}

impl Scanner for BreakoutScanner {
    fn strategy_name(&self) -> &str {
        "breakout"
    }

    fn scan(&self, date: NaiveDate) -> Result<Vec<Candidate>, PolicyError> {
        let mut candidates = Vec::new();

        for symbol in &self.universe {
            let bars = match self.store.fetch_daily_bars(symbol, self.history_start(date), date) {
                Ok(bars) => bars,
                // A symbol without data today is not a scan failure.
                Err(DataError::Unavailable { .. }) | Err(DataError::SymbolNotFound { .. }) => {
                    continue
                }
                Err(e) => return Err(e.into()),
            };

            let Some(today) = bars.last().filter(|b| b.date == date) else {
                continue;
            };
            if today.volume < self.min_volume || !today.is_sane() {
                continue;
            }

            // Prior high excludes today's bar.
            let history = &bars[..bars.len() - 1];
            let Some(prior_high) = highest_high(history, self.lookback) else {
                continue;
            };
            if today.close <= prior_high {
                continue;
            }

            let Some(atr_value) = atr(&bars, self.atr_period) else {
                continue;
            };
            let margin_pct = (today.close - prior_high) / prior_high * 100.0;
            let stop = today.close - self.stop_atr_mult * atr_value;

            candidates.push(
                Candidate::new(symbol.clone(), date, margin_pct)
                    .with_prices(today.close, stop)
                    .with_metadata("prior_high", format!("{prior_high:.4}"))
                    .with_metadata("atr", format!("{atr_value:.4}")),
            );
        }

        Ok(candidates)
    }
}
