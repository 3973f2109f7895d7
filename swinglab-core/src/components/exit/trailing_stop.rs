//! Percent trailing stop: the stop follows the close upward, never downward.

use super::{stop_fill_price, ExitPolicy};
use crate::components::PolicyError;
use crate::domain::{Bar, ExitReason, ExitSignal, Position};
use chrono::NaiveDate;

/// Trails the stop `trail_pct` below the highest close seen while the position
/// is open. The ratchet lives in `Position::raise_stop`, so the stop only
/// tightens; the exit check runs before the advance, matching how a resting
/// stop order would have been placed the prior day.
pub struct TrailingStop {
    pub trail_pct: f64,
}

impl TrailingStop {
    pub fn new(trail_pct: f64) -> Self {
        Self { trail_pct }
    }
}

impl ExitPolicy for TrailingStop {
    fn name(&self) -> &str {
        "trailing_stop"
    }

    fn initial_stop(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.trail_pct / 100.0)
    }

    fn check_exit(
        &self,
        position: &mut Position,
        current_price: f64,
        _current_date: NaiveDate,
        recent_bars: &[Bar],
    ) -> Result<ExitSignal, PolicyError> {
        let bar = recent_bars
            .last()
            .ok_or_else(|| PolicyError::new("trailing_stop: empty bar history"))?;

        let stop = position.stop();
        if stop > 0.0 && bar.low <= stop {
            return Ok(ExitSignal::full(
                stop_fill_price(bar, stop),
                ExitReason::TrailingStop,
            ));
        }

        position.raise_stop(current_price * (1.0 - self.trail_pct / 100.0));
        Ok(ExitSignal::hold())
    }
}
