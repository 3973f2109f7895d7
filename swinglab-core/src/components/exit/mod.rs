//! Exit policy trait and concrete implementations.

pub mod composite;
pub mod hard_stop;
pub mod ma_break;
pub mod scale_out;
pub mod target;
pub mod time_limit;
pub mod trailing_stop;

pub use composite::CompositeExit;
pub use hard_stop::HardStop;
pub use ma_break::MaBreakExit;
pub use scale_out::ScaleOutExit;
pub use target::TargetExit;
pub use time_limit::TimeLimitExit;
pub use trailing_stop::TrailingStop;

use super::PolicyError;
use crate::domain::{Bar, ExitSignal, Position};
use chrono::NaiveDate;

/// Exit decision policy for open positions.
///
/// `check_exit` must be deterministic given identical inputs plus the
/// position's own stop state, which the policy is permitted to advance through
/// `Position::raise_stop` (the ratchet blocks loosening). `recent_bars` is the
/// symbol's daily series in ascending order, ending with the bar for
/// `current_date`; `current_price` is that bar's close.
///
/// The engine checks `supports_partial_exits()` before honoring any
/// `exit_fraction < 1`; policies that never scale out keep the default.
pub trait ExitPolicy: Send + Sync {
    /// Name used in configs, results, and artifact headers.
    fn name(&self) -> &str;

    /// Initial stop for a fresh position. Used when a candidate carries no
    /// suggested stop of its own.
    fn initial_stop(&self, entry_price: f64) -> f64;

    fn supports_partial_exits(&self) -> bool {
        false
    }

    fn check_exit(
        &self,
        position: &mut Position,
        current_price: f64,
        current_date: NaiveDate,
        recent_bars: &[Bar],
    ) -> Result<ExitSignal, PolicyError>;
}

/// Fill price for a long exit through a stop level: a gap through the stop
/// fills at the open, otherwise at the stop itself.
pub(crate) fn stop_fill_price(bar: &Bar, stop: f64) -> f64 {
    if bar.open < stop {
        bar.open
    } else {
        stop
    }
}

/// Fill price for a long exit through a target level: a gap above the target
/// fills at the open, otherwise at the target.
pub(crate) fn target_fill_price(bar: &Bar, target: f64) -> f64 {
    if bar.open > target {
        bar.open
    } else {
        target
    }
}
