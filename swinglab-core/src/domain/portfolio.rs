//! Portfolio — authoritative bookkeeping of cash and open positions for one run.

use super::candidate::Candidate;
use super::exit_signal::ExitSignal;
use super::ids::{IdGen, PositionId};
use super::position::Position;
use super::trade::{ExitReason, Trade};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One sample of the equity curve: end-of-day portfolio value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Why `open_position` declined a sized candidate. A normal control-flow
/// outcome, not an error — the engine records it in run diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpenRejection {
    /// The open-position count is already at the configured maximum.
    CapacityFull,
    /// The sizer's cash requirement exceeds available cash.
    InsufficientCash { required: f64, available: f64 },
}

/// Output of the position sizer: shares to buy and the cash they consume.
/// Zero shares means "skip this candidate".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub shares: u32,
    pub cash_required: f64,
}

impl PositionSize {
    pub fn skip() -> Self {
        Self {
            shares: 0,
            cash_required: 0.0,
        }
    }

    pub fn of(shares: u32, price: f64) -> Self {
        Self {
            shares,
            cash_required: f64::from(shares) * price,
        }
    }

    pub fn is_skip(&self) -> bool {
        self.shares == 0
    }
}

/// Aggregate portfolio state: cash, open positions (oldest first), realized
/// trades, and the equity curve.
///
/// The accounting identity `equity == cash + sum(open market values)` must hold
/// at every mark; cash never goes negative because `open_position` rejects
/// rather than clamps.
#[derive(Debug)]
pub struct Portfolio {
    cash: f64,
    initial_capital: f64,
    max_positions: usize,
    /// Open positions in open order. Exit evaluation walks this oldest-first.
    open: Vec<Position>,
    closed: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    id_gen: IdGen,
    last_mark: Option<NaiveDate>,
}

impl Portfolio {
    pub fn new(initial_capital: f64, max_positions: usize) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            max_positions,
            open: Vec::new(),
            closed: Vec::new(),
            equity_curve: Vec::new(),
            id_gen: IdGen::default(),
            last_mark: None,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn max_positions(&self) -> usize {
        self.max_positions
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.open
    }

    /// Ids of open positions, oldest first.
    pub fn open_ids(&self) -> Vec<PositionId> {
        self.open.iter().map(|p| p.id).collect()
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.open.iter().any(|p| p.symbol == symbol)
    }

    pub fn position(&self, id: PositionId) -> Option<&Position> {
        self.open.iter().find(|p| p.id == id)
    }

    pub fn position_mut(&mut self, id: PositionId) -> Option<&mut Position> {
        self.open.iter_mut().find(|p| p.id == id)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.closed
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Equity at the most recent mark, or initial capital before the first one.
    pub fn last_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }

    /// Commit a sized candidate as an open position.
    ///
    /// Rejects (does not panic or clamp) when the book is at capacity or the
    /// required cash exceeds what is available. On success the cash is debited
    /// and the position appended to the open set.
    pub fn open_position(
        &mut self,
        candidate: &Candidate,
        size: &PositionSize,
        stop: f64,
        date: NaiveDate,
    ) -> Result<PositionId, OpenRejection> {
        debug_assert!(size.shares > 0, "zero-share opens must be skipped upstream");
        if self.open.len() >= self.max_positions {
            return Err(OpenRejection::CapacityFull);
        }
        if size.cash_required > self.cash + 1e-9 {
            return Err(OpenRejection::InsufficientCash {
                required: size.cash_required,
                available: self.cash,
            });
        }
        let id = self.id_gen.next_position_id();
        self.cash -= size.cash_required;
        self.open.push(Position::open(
            id,
            candidate.symbol.clone(),
            date,
            candidate.entry_price,
            size.shares,
            stop,
        ));
        Ok(id)
    }

    /// Apply an exit signal to an open position.
    ///
    /// Liquidates `exit_fraction × original_shares`, rounded to whole shares
    /// and clamped to the remaining share count (always at least one share).
    /// The remainder stays open with its stop price unchanged. Returns the
    /// realized trade, or None if the id is unknown or the signal is a hold.
    pub fn apply_exit(
        &mut self,
        id: PositionId,
        signal: &ExitSignal,
        date: NaiveDate,
    ) -> Option<Trade> {
        if !signal.should_exit {
            return None;
        }
        let idx = self.open.iter().position(|p| p.id == id)?;
        let pos = &mut self.open[idx];

        let requested = (signal.exit_fraction * f64::from(pos.original_shares)).round() as u32;
        let shares_sold = requested.clamp(1, pos.shares);

        let proceeds = f64::from(shares_sold) * signal.exit_price;
        self.cash += proceeds;
        pos.shares -= shares_sold;

        let trade = Trade {
            symbol: pos.symbol.clone(),
            entry_date: pos.entry_date,
            entry_price: pos.entry_price,
            exit_date: date,
            exit_price: signal.exit_price,
            shares: shares_sold,
            pnl: f64::from(shares_sold) * (signal.exit_price - pos.entry_price),
            reason: signal.reason.unwrap_or(ExitReason::StopLoss),
            holding_days: (date - pos.entry_date).num_days(),
        };

        if pos.is_closed() {
            self.open.remove(idx);
        }
        self.closed.push(trade.clone());
        Some(trade)
    }

    /// Sum cash plus each open position's market value and append the result to
    /// the equity curve. Must be called exactly once per simulated day, after
    /// that day's entries and exits.
    ///
    /// Symbols missing from `prices` are valued at their entry price.
    pub fn mark_to_market(&mut self, date: NaiveDate, prices: &HashMap<String, f64>) -> f64 {
        debug_assert!(
            self.last_mark != Some(date),
            "mark_to_market called twice for {date}"
        );
        debug_assert!(self.cash > -1e-9, "cash went negative: {}", self.cash);

        let position_value: f64 = self
            .open
            .iter()
            .map(|p| {
                let price = prices.get(&p.symbol).copied().unwrap_or(p.entry_price);
                p.market_value(price)
            })
            .sum();
        let equity = self.cash + position_value;
        self.equity_curve.push(EquityPoint { date, equity });
        self.last_mark = Some(date);
        equity
    }
}
