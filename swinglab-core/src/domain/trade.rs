//! Trade — an immutable realized record created by a full or partial exit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a position (or part of one) was liquidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    Target,
    MaBreak,
    TimeLimit,
    EndOfBacktest,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StopLoss => "STOP_LOSS",
            Self::TrailingStop => "TRAILING_STOP",
            Self::Target => "TARGET",
            Self::MaBreak => "MA_BREAK",
            Self::TimeLimit => "TIME_LIMIT",
            Self::EndOfBacktest => "END_OF_BACKTEST",
        }
    }
}

/// A realized trade. One Position can produce several of these when the exit
/// policy scales out; the shares across them sum to the original share count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    /// Shares liquidated by this exit, not the position's original size.
    pub shares: u32,
    pub pnl: f64,
    pub reason: ExitReason,
    pub holding_days: i64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    /// Return on the liquidated shares as a fraction of their entry cost.
    pub fn return_pct(&self) -> f64 {
        let cost = self.entry_price * f64::from(self.shares);
        if cost == 0.0 {
            return 0.0;
        }
        self.pnl / cost
    }
}
