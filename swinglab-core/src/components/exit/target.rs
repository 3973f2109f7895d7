//! Profit target: exit in full when the day's high reaches the target.

use super::{target_fill_price, ExitPolicy};
use crate::components::PolicyError;
use crate::domain::{Bar, ExitReason, ExitSignal, Position};
use chrono::NaiveDate;

/// Exits at `target_pct` above entry. The target is derived from the
/// position's entry price, so it needs no per-position state.
pub struct TargetExit {
    pub target_pct: f64,
    pub fallback_stop_pct: f64,
}

impl TargetExit {
    pub fn new(target_pct: f64) -> Self {
        Self {
            target_pct,
            fallback_stop_pct: 8.0,
        }
    }

    fn target_for(&self, position: &Position) -> f64 {
        position.entry_price * (1.0 + self.target_pct / 100.0)
    }
}

impl ExitPolicy for TargetExit {
    fn name(&self) -> &str {
        "target"
    }

    fn initial_stop(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.fallback_stop_pct / 100.0)
    }

    fn check_exit(
        &self,
        position: &mut Position,
        _current_price: f64,
        _current_date: NaiveDate,
        recent_bars: &[Bar],
    ) -> Result<ExitSignal, PolicyError> {
        let bar = recent_bars
            .last()
            .ok_or_else(|| PolicyError::new("target: empty bar history"))?;
        let target = self.target_for(position);
        if bar.high >= target {
            return Ok(ExitSignal::full(target_fill_price(bar, target), ExitReason::Target));
        }
        Ok(ExitSignal::hold())
    }
}
