//! Position — an open trade with mutable share count and ratcheting stop.

use super::ids::PositionId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long position.
///
/// Shares shrink under partial exits; the position closes (and leaves the open
/// set) when shares reach zero. The stop price may only ratchet upward —
/// `raise_stop` ignores a lower value, `reset_stop` is the explicit override
/// for policies that deliberately re-anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: u32,
    /// Share count at open, the base for partial-exit fractions.
    pub original_shares: u32,
    stop: f64,
}

impl Position {
    pub fn open(
        id: PositionId,
        symbol: impl Into<String>,
        entry_date: NaiveDate,
        entry_price: f64,
        shares: u32,
        stop: f64,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            entry_date,
            entry_price,
            shares,
            original_shares: shares,
            stop,
        }
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    /// Ratchet the stop upward. A value at or below the current stop is a no-op.
    /// Returns true if the stop moved.
    pub fn raise_stop(&mut self, new_stop: f64) -> bool {
        if new_stop > self.stop {
            self.stop = new_stop;
            true
        } else {
            false
        }
    }

    /// Explicitly re-anchor the stop, bypassing the ratchet.
    pub fn reset_stop(&mut self, new_stop: f64) {
        self.stop = new_stop;
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        f64::from(self.shares) * current_price
    }

    pub fn cost_basis(&self) -> f64 {
        f64::from(self.shares) * self.entry_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        f64::from(self.shares) * (current_price - self.entry_price)
    }

    /// Calendar days held as of `as_of` (0 on the entry day).
    pub fn holding_days(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.entry_date).num_days()
    }

    pub fn is_closed(&self) -> bool {
        self.shares == 0
    }
}
