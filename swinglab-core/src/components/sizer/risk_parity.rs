//! Risk-parity sizer: equal risk budget per trade, sized off the stop distance.

use super::{fit_to_cash, AccountState, PositionSizer};
use crate::components::PolicyError;
use crate::domain::{Candidate, PositionSize};

/// Risks `risk_fraction` of equity per trade: shares = risk budget divided by
/// the per-share distance from entry to the candidate's stop. Wide stops get
/// small positions, tight stops get large ones, so every trade loses roughly
/// the same amount if its stop is hit.
pub struct RiskParitySizer {
    pub risk_fraction: f64,
}

impl RiskParitySizer {
    pub fn new(risk_fraction: f64) -> Self {
        Self { risk_fraction }
    }
}

impl PositionSizer for RiskParitySizer {
    fn name(&self) -> &str {
        "risk_parity"
    }

    fn size(
        &self,
        account: &AccountState,
        candidate: &Candidate,
    ) -> Result<PositionSize, PolicyError> {
        if candidate.entry_price <= 0.0 {
            return Err(PolicyError::new(format!(
                "risk_parity: non-positive entry price for {}",
                candidate.symbol
            )));
        }
        let per_share_risk = candidate.entry_price - candidate.stop_price;
        if per_share_risk <= 0.0 {
            // A stop at or above entry makes the risk undefined; skip rather
            // than divide by it.
            return Ok(PositionSize::skip());
        }
        let risk_budget = account.equity * self.risk_fraction;
        let shares = (risk_budget / per_share_risk).floor() as u32;
        Ok(fit_to_cash(shares, candidate.entry_price, account.cash))
    }
}
