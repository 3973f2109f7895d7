//! Moving-average break: exit at the close when it falls below the SMA.

use super::ExitPolicy;
use crate::components::PolicyError;
use crate::domain::{Bar, ExitReason, ExitSignal, Position};
use crate::indicators::sma;
use chrono::NaiveDate;

pub struct MaBreakExit {
    pub period: usize,
    /// Fallback stop distance for positions opened without a suggested stop.
    pub fallback_stop_pct: f64,
}

impl MaBreakExit {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            fallback_stop_pct: 8.0,
        }
    }
}

impl ExitPolicy for MaBreakExit {
    fn name(&self) -> &str {
        "ma_break"
    }

    fn initial_stop(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.fallback_stop_pct / 100.0)
    }

    fn check_exit(
        &self,
        _position: &mut Position,
        current_price: f64,
        _current_date: NaiveDate,
        recent_bars: &[Bar],
    ) -> Result<ExitSignal, PolicyError> {
        // Not enough history yet: hold rather than guess.
        let Some(ma) = sma(recent_bars, self.period) else {
            return Ok(ExitSignal::hold());
        };
        if current_price < ma {
            return Ok(ExitSignal::full(current_price, ExitReason::MaBreak));
        }
        Ok(ExitSignal::hold())
    }
}
