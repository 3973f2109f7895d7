//! ExitSignal — the exit policy's verdict for one position on one day.

use super::trade::ExitReason;
use serde::{Deserialize, Serialize};

/// Output of an exit policy evaluation. Pure data; the engine applies it.
///
/// `exit_fraction` is a fraction of the position's *original* share count,
/// in (0, 1]. A fraction below 1 is only honored when the policy reports
/// `supports_partial_exits()`; otherwise the engine promotes it to a full exit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitSignal {
    pub should_exit: bool,
    pub exit_fraction: f64,
    pub exit_price: f64,
    pub reason: Option<ExitReason>,
}

impl ExitSignal {
    /// No exit today.
    pub fn hold() -> Self {
        Self {
            should_exit: false,
            exit_fraction: 0.0,
            exit_price: 0.0,
            reason: None,
        }
    }

    /// Liquidate the entire remaining position.
    pub fn full(exit_price: f64, reason: ExitReason) -> Self {
        Self {
            should_exit: true,
            exit_fraction: 1.0,
            exit_price,
            reason: Some(reason),
        }
    }

    /// Liquidate `fraction` of the original share count.
    pub fn partial(fraction: f64, exit_price: f64, reason: ExitReason) -> Self {
        debug_assert!(fraction > 0.0 && fraction <= 1.0, "fraction out of (0, 1]");
        Self {
            should_exit: true,
            exit_fraction: fraction,
            exit_price,
            reason: Some(reason),
        }
    }

    pub fn is_full(&self) -> bool {
        self.should_exit && self.exit_fraction >= 1.0
    }
}
