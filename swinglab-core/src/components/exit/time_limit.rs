//! Time limit: exit at the close once the holding period is exhausted.

use super::ExitPolicy;
use crate::components::PolicyError;
use crate::domain::{Bar, ExitReason, ExitSignal, Position};
use chrono::NaiveDate;

pub struct TimeLimitExit {
    pub max_days: i64,
    pub fallback_stop_pct: f64,
}

impl TimeLimitExit {
    pub fn new(max_days: i64) -> Self {
        Self {
            max_days,
            fallback_stop_pct: 8.0,
        }
    }
}

impl ExitPolicy for TimeLimitExit {
    fn name(&self) -> &str {
        "time_limit"
    }

    fn initial_stop(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.fallback_stop_pct / 100.0)
    }

    fn check_exit(
        &self,
        position: &mut Position,
        current_price: f64,
        current_date: NaiveDate,
        _recent_bars: &[Bar],
    ) -> Result<ExitSignal, PolicyError> {
        if position.holding_days(current_date) >= self.max_days {
            return Ok(ExitSignal::full(current_price, ExitReason::TimeLimit));
        }
        Ok(ExitSignal::hold())
    }
}
