//! Composite exit: evaluates sub-policies in a fixed priority order.

use super::ExitPolicy;
use crate::components::PolicyError;
use crate::domain::{Bar, ExitSignal, Position};
use chrono::NaiveDate;

/// Chains exit policies; the first sub-policy that fires wins and later ones
/// are not consulted that day.
///
/// The evaluation order is the construction order and is part of the contract:
/// reordering legs changes simulated outcomes (a stop and a target can both be
/// touchable within one bar). The builtin registration wires the conventional
/// priority: hard stop, then trailing stop, then target, then MA break, then
/// time limit.
///
/// Legs after the firing one are skipped entirely, so a trailing leg does not
/// advance its stop on a day an earlier leg already exited.
pub struct CompositeExit {
    legs: Vec<Box<dyn ExitPolicy>>,
}

impl CompositeExit {
    /// Panics if `legs` is empty — a composite with no legs has no initial
    /// stop to offer.
    pub fn new(legs: Vec<Box<dyn ExitPolicy>>) -> Self {
        assert!(!legs.is_empty(), "CompositeExit requires at least one leg");
        Self { legs }
    }

    pub fn leg_names(&self) -> Vec<&str> {
        self.legs.iter().map(|l| l.name()).collect()
    }
}

impl ExitPolicy for CompositeExit {
    fn name(&self) -> &str {
        "composite"
    }

    /// The first leg owns the initial stop: by convention the protective stop
    /// leg is registered first.
    fn initial_stop(&self, entry_price: f64) -> f64 {
        self.legs[0].initial_stop(entry_price)
    }

    fn supports_partial_exits(&self) -> bool {
        self.legs.iter().any(|l| l.supports_partial_exits())
    }

    fn check_exit(
        &self,
        position: &mut Position,
        current_price: f64,
        current_date: NaiveDate,
        recent_bars: &[Bar],
    ) -> Result<ExitSignal, PolicyError> {
        for leg in &self.legs {
            let signal = leg.check_exit(position, current_price, current_date, recent_bars)?;
            if signal.should_exit {
                return Ok(signal);
            }
        }
        Ok(ExitSignal::hold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::exit::{HardStop, TargetExit, TimeLimitExit};
    use crate::domain::{ExitReason, PositionId};

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
            date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn stop_then_target() -> CompositeExit {
        CompositeExit::new(vec![
            Box::new(HardStop::new(5.0)),
            Box::new(TargetExit::new(10.0)),
        ])
    }

    #[test]
    fn first_firing_leg_wins() {
        // Wide bar: both the stop (95) and the target (110) are touchable.
        // The stop leg is evaluated first, so the stop must win.
        let composite = stop_then_target();
        let mut pos = position(95.0);
        let bars = [bar(100.0, 111.0, 94.0, 100.0)];
        let sig = composite.check_exit(&mut pos, 100.0, bars[0].date, &bars).unwrap();
        assert_eq!(sig.reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn later_legs_fire_when_earlier_hold() {
        let composite = stop_then_target();
        let mut pos = position(95.0);
        let bars = [bar(106.0, 111.0, 105.0, 109.0)];
        let sig = composite.check_exit(&mut pos, 109.0, bars[0].date, &bars).unwrap();
        assert_eq!(sig.reason, Some(ExitReason::Target));
    }

    #[test]
    fn holds_when_no_leg_fires() {
        let composite = stop_then_target();
        let mut pos = position(95.0);
        let bars = [bar(100.0, 103.0, 99.0, 102.0)];
        let sig = composite.check_exit(&mut pos, 102.0, bars[0].date, &bars).unwrap();
        assert!(!sig.should_exit);
    }

    #[test]
    fn initial_stop_comes_from_first_leg() {
        let composite = stop_then_target();
        // HardStop(5%) is first: 100 -> 95.
        assert!((composite.initial_stop(100.0) - 95.0).abs() < 1e-12);
    }

    #[test]
    fn reordering_changes_outcomes() {
        // Same wide bar, reversed priority: the target now wins.
        let reversed = CompositeExit::new(vec![
            Box::new(TargetExit::new(10.0)),
            Box::new(HardStop::new(5.0)),
        ]);
        let mut pos = position(95.0);
        let bars = [bar(100.0, 111.0, 94.0, 100.0)];
        let sig = reversed.check_exit(&mut pos, 100.0, bars[0].date, &bars).unwrap();
        assert_eq!(sig.reason, Some(ExitReason::Target));
    }

    #[test]
    fn time_limit_leg_composes() {
        let composite = CompositeExit::new(vec![
            Box::new(HardStop::new(5.0)),
            Box::new(TimeLimitExit::new(3)),
        ]);
        let mut pos = position(95.0);
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(); // 7 days held
        let bars = [bar(100.0, 103.0, 99.0, 102.0)];
        let sig = composite.check_exit(&mut pos, 102.0, date, &bars).unwrap();
        assert_eq!(sig.reason, Some(ExitReason::TimeLimit));
    }
}
