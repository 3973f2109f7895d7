//! Performance metrics — pure functions over trades and the equity curve.
//!
//! Every metric is a pure function: starting capital, trade list, and/or
//! equity curve in, scalar out. No dependencies on the engine or data layer.
//! All functions tolerate zero-trade runs — "no signal found" is a reportable
//! outcome, not a failure.

use crate::domain::{EquityPoint, Trade};
use serde::{Deserialize, Serialize};

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub total_return_pct: f64,
    /// Winning trades as a percentage of all trades; 0 when there are none.
    pub win_rate_pct: f64,
    /// Gross wins over gross losses. `None` means no losing trades — the
    /// "not applicable" sentinel rather than an infinity that JSON can't carry.
    pub profit_factor: Option<f64>,
    /// Maximum peak-to-trough decline, as a positive percentage of the peak.
    pub max_drawdown_pct: f64,
    /// Average trade P&L in currency.
    pub expectancy: f64,
    pub avg_hold_days: f64,
    pub trade_count: usize,
    pub cagr_pct: f64,
    pub sharpe: f64,
    /// Fraction of simulated days with at least one open position, in percent.
    pub exposure_pct: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl MetricsReport {
    pub fn compute(starting_capital: f64, trades: &[Trade], equity_curve: &[EquityPoint]) -> Self {
        Self {
            total_return_pct: total_return_pct(starting_capital, equity_curve),
            win_rate_pct: win_rate_pct(trades),
            profit_factor: profit_factor(trades),
            max_drawdown_pct: max_drawdown_pct(equity_curve),
            expectancy: expectancy(trades),
            avg_hold_days: avg_hold_days(trades),
            trade_count: trades.len(),
            cagr_pct: cagr_pct(starting_capital, equity_curve),
            sharpe: sharpe_ratio(equity_curve),
            exposure_pct: exposure_pct(trades, equity_curve),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// (final equity - starting capital) / starting capital, in percent.
pub fn total_return_pct(starting_capital: f64, equity_curve: &[EquityPoint]) -> f64 {
    if starting_capital <= 0.0 {
        return 0.0;
    }
    let Some(last) = equity_curve.last() else {
        return 0.0;
    };
    (last.equity - starting_capital) / starting_capital * 100.0
}

/// Winning trades / total trades, in percent. Zero when there are no trades.
pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Gross winning P&L over the magnitude of gross losing P&L.
///
/// `None` when there are no losing trades (nothing to divide by); 0 when there
/// are no winners either.
pub fn profit_factor(trades: &[Trade]) -> Option<f64> {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        if gross_profit > 0.0 {
            return None;
        }
        return Some(0.0);
    }
    Some(gross_profit / gross_loss)
}

/// Maximum peak-to-trough decline over the equity curve, as a positive
/// percentage. One linear scan tracking the running peak.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            let dd = (peak - point.equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Average trade P&L in currency. Zero with no trades.
pub fn expectancy(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.pnl).sum::<f64>() / trades.len() as f64
}

/// Mean holding period in calendar days over closed trades.
pub fn avg_hold_days(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.holding_days as f64).sum::<f64>() / trades.len() as f64
}

/// Compound annual growth rate in percent, assuming 252 trading days/year.
pub fn cagr_pct(starting_capital: f64, equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 || starting_capital <= 0.0 {
        return 0.0;
    }
    let final_eq = equity_curve.last().expect("len checked").equity;
    if final_eq <= 0.0 {
        return 0.0;
    }
    let years = equity_curve.len() as f64 / 252.0;
    ((final_eq / starting_capital).powf(1.0 / years) - 1.0) * 100.0
}

/// Annualized Sharpe ratio from daily equity returns, risk-free rate 0.
pub fn sharpe_ratio(equity_curve: &[EquityPoint]) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let std = variance.sqrt();
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * (252.0_f64).sqrt()
}

/// Percentage of curve days covered by at least one trade's holding interval.
/// Entry day inclusive, exit day inclusive (a same-day round trip counts).
pub fn exposure_pct(trades: &[Trade], equity_curve: &[EquityPoint]) -> f64 {
    if trades.is_empty() || equity_curve.is_empty() {
        return 0.0;
    }
    let exposed = equity_curve
        .iter()
        .filter(|point| {
            trades
                .iter()
                .any(|t| t.entry_date <= point.date && point.date <= t.exit_date)
        })
        .count();
    exposed as f64 / equity_curve.len() as f64 * 100.0
}

fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0].equity > 0.0 {
                (w[1].equity - w[0].equity) / w[0].equity
            } else {
                0.0
            }
        })
        .collect()
}

fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}
