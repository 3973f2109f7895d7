//! Hard stop: exit in full when the day's low trades through the stop.

use super::{stop_fill_price, ExitPolicy};
use crate::components::PolicyError;
use crate::domain::{Bar, ExitReason, ExitSignal, Position};
use chrono::NaiveDate;

/// Fixed protective stop. Never moves the stop itself — it honors whatever the
/// position's stop currently is (the candidate's suggested stop, or another
/// policy's trailing value when used inside a composite).
pub struct HardStop {
    /// Default stop distance for positions opened without a suggested stop.
    pub stop_pct: f64,
}

impl HardStop {
    pub fn new(stop_pct: f64) -> Self {
        Self { stop_pct }
    }
}

impl ExitPolicy for HardStop {
    fn name(&self) -> &str {
        "hard_stop"
    }

    fn initial_stop(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.stop_pct / 100.0)
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
            .ok_or_else(|| PolicyError::new("hard_stop: empty bar history"))?;
        let stop = position.stop();
        if stop > 0.0 && bar.low <= stop {
            return Ok(ExitSignal::full(stop_fill_price(bar, stop), ExitReason::StopLoss));
        }
        Ok(ExitSignal::hold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionId;

    fn position(stop: f64) -> Position {
        Position::open(
            PositionId(1),
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            100.0,
            50,
            stop,
        )
    }

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn holds_above_stop() {
        let policy = HardStop::new(5.0);
        let mut pos = position(95.0);
        let bars = [bar(100.0, 102.0, 96.0, 101.0)];
        let sig = policy.check_exit(&mut pos, 101.0, bars[0].date, &bars).unwrap();
        assert!(!sig.should_exit);
    }

    #[test]
    fn exits_when_low_touches_stop() {
        let policy = HardStop::new(5.0);
        let mut pos = position(95.0);
        let bars = [bar(100.0, 101.0, 94.5, 96.0)];
        let sig = policy.check_exit(&mut pos, 96.0, bars[0].date, &bars).unwrap();
        assert!(sig.is_full());
        assert_eq!(sig.exit_price, 95.0);
        assert_eq!(sig.reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn gap_down_fills_at_open() {
        let policy = HardStop::new(5.0);
        let mut pos = position(95.0);
        let bars = [bar(90.0, 93.0, 89.0, 92.0)];
        let sig = policy.check_exit(&mut pos, 92.0, bars[0].date, &bars).unwrap();
        assert_eq!(sig.exit_price, 90.0);
    }

    #[test]
    fn initial_stop_from_percent() {
        let policy = HardStop::new(5.0);
        assert!((policy.initial_stop(200.0) - 190.0).abs() < 1e-12);
    }
}
