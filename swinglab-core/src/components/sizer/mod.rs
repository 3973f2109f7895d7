//! Position sizer trait and concrete implementations.

pub mod fixed_dollar;
pub mod fixed_fraction;
pub mod risk_parity;

pub use fixed_dollar::FixedDollarSizer;
pub use fixed_fraction::FixedFractionSizer;
pub use risk_parity::RiskParitySizer;

use super::PolicyError;
use crate::domain::{Candidate, PositionSize};

/// Snapshot of the account handed to the sizer. Equity is as of the previous
/// day's mark-to-market, so sizing is deterministic within the day regardless
/// of how many candidates precede this one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountState {
    pub cash: f64,
    pub equity: f64,
    pub open_positions: usize,
    pub max_positions: usize,
}

/// Position sizing logic: account state + candidate in, share count out.
///
/// Sizers never open positions themselves and never see the portfolio — a zero
/// share count is the "skip this candidate" verdict (insufficient buying power,
/// risk budget exhausted, price out of bounds). Sizers must not exceed
/// available cash; the portfolio rejects such opens rather than clamping.
pub trait PositionSizer: Send + Sync {
    /// Name used in configs, results, and artifact headers.
    fn name(&self) -> &str;

    fn size(&self, account: &AccountState, candidate: &Candidate)
        -> Result<PositionSize, PolicyError>;
}

/// Clamp a share count so its cost fits in available cash.
pub(crate) fn fit_to_cash(shares: u32, price: f64, cash: f64) -> PositionSize {
    if price <= 0.0 {
        return PositionSize::skip();
    }
    let affordable = (cash / price).floor() as u32;
    let shares = shares.min(affordable);
    if shares == 0 {
        return PositionSize::skip();
    }
    PositionSize::of(shares, price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_to_cash_clamps() {
        let size = fit_to_cash(100, 50.0, 600.0);
        assert_eq!(size.shares, 12);
        assert_eq!(size.cash_required, 600.0);
    }

    #[test]
    fn fit_to_cash_skips_when_unaffordable() {
        assert!(fit_to_cash(100, 50.0, 30.0).is_skip());
        assert!(fit_to_cash(100, 0.0, 1000.0).is_skip());
    }
}
