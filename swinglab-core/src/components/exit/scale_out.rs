//! Scale-out exit: sell part at the target, trail the remainder.

use super::{stop_fill_price, target_fill_price, ExitPolicy};
use crate::components::PolicyError;
use crate::domain::{Bar, ExitReason, ExitSignal, Position};
use chrono::NaiveDate;

/// Two-stage exit. While the full position is on, a touch of the target sells
/// `scale_fraction` of the original shares; afterwards the remainder rides a
/// percent trailing stop. Whether the first stage has happened is derived from
/// the position itself (`shares < original_shares`), so the policy carries no
/// per-position state of its own.
pub struct ScaleOutExit {
    pub target_pct: f64,
    pub scale_fraction: f64,
    pub trail_pct: f64,
}

impl ScaleOutExit {
    pub fn new(target_pct: f64, scale_fraction: f64, trail_pct: f64) -> Self {
        debug_assert!(scale_fraction > 0.0 && scale_fraction < 1.0);
        Self {
            target_pct,
            scale_fraction,
            trail_pct,
        }
    }

    fn has_scaled(position: &Position) -> bool {
        position.shares < position.original_shares
    }
}

impl ExitPolicy for ScaleOutExit {
    fn name(&self) -> &str {
        "scale_out"
    }

    fn initial_stop(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.trail_pct / 100.0)
    }

    fn supports_partial_exits(&self) -> bool {
        true
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
            .ok_or_else(|| PolicyError::new("scale_out: empty bar history"))?;

        // Protective stop applies at every stage.
        let stop = position.stop();
        if stop > 0.0 && bar.low <= stop {
            let reason = if Self::has_scaled(position) {
                ExitReason::TrailingStop
            } else {
                ExitReason::StopLoss
            };
            return Ok(ExitSignal::full(stop_fill_price(bar, stop), reason));
        }

        if !Self::has_scaled(position) {
            let target = position.entry_price * (1.0 + self.target_pct / 100.0);
            if bar.high >= target {
                return Ok(ExitSignal::partial(
                    self.scale_fraction,
                    target_fill_price(bar, target),
                    ExitReason::Target,
                ));
            }
            return Ok(ExitSignal::hold());
        }

        // Remainder stage: trail the stop under the close.
        position.raise_stop(current_price * (1.0 - self.trail_pct / 100.0));
        Ok(ExitSignal::hold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionId;

    fn position() -> Position {
        Position::open(
            PositionId(1),
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            100.0,
            100,
            94.0,
        )
    }

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn declares_partial_support() {
        assert!(ScaleOutExit::new(8.0, 0.25, 5.0).supports_partial_exits());
    }

    #[test]
    fn first_target_touch_scales_out() {
        let policy = ScaleOutExit::new(8.0, 0.25, 5.0);
        let mut pos = position();
        let bars = [bar(106.0, 109.0, 105.0, 108.5)]; // target = 108
        let sig = policy.check_exit(&mut pos, 108.5, bars[0].date, &bars).unwrap();
        assert!(sig.should_exit);
        assert!(!sig.is_full());
        assert_eq!(sig.exit_fraction, 0.25);
        assert_eq!(sig.exit_price, 108.0);
        assert_eq!(sig.reason, Some(ExitReason::Target));
    }

    #[test]
    fn remainder_trails_after_scale() {
        let policy = ScaleOutExit::new(8.0, 0.25, 5.0);
        let mut pos = position();
        pos.shares = 75; // scale-out already applied by the portfolio

        let bars = [bar(110.0, 121.0, 110.0, 120.0)];
        let sig = policy.check_exit(&mut pos, 120.0, bars[0].date, &bars).unwrap();
        assert!(!sig.should_exit);
        assert!((pos.stop() - 114.0).abs() < 1e-9); // 120 * 0.95

        // Now a slide through the trailed stop closes the remainder.
        let bars = [bar(114.5, 115.0, 113.0, 113.5)];
        let sig = policy.check_exit(&mut pos, 113.5, bars[0].date, &bars).unwrap();
        assert!(sig.is_full());
        assert_eq!(sig.reason, Some(ExitReason::TrailingStop));
        assert_eq!(sig.exit_price, 114.0);
    }

    #[test]
    fn stop_loss_before_any_scale() {
        let policy = ScaleOutExit::new(8.0, 0.25, 5.0);
        let mut pos = position();
        let bars = [bar(95.0, 96.0, 93.0, 93.5)];
        let sig = policy.check_exit(&mut pos, 93.5, bars[0].date, &bars).unwrap();
        assert!(sig.is_full());
        assert_eq!(sig.reason, Some(ExitReason::StopLoss));
    }
}
