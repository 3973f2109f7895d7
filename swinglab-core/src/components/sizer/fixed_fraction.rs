//! Fixed-fraction sizer: each position targets a fraction of equity.

use super::{fit_to_cash, AccountState, PositionSizer};
use crate::components::PolicyError;
use crate::domain::{Candidate, PositionSize};

pub struct FixedFractionSizer {
    pub fraction: f64,
}

impl FixedFractionSizer {
    pub fn new(fraction: f64) -> Self {
        Self { fraction }
    }
}

impl PositionSizer for FixedFractionSizer {
    fn name(&self) -> &str {
        "fixed_fraction"
    }

    fn size(
        &self,
        account: &AccountState,
        candidate: &Candidate,
    ) -> Result<PositionSize, PolicyError> {
        if candidate.entry_price <= 0.0 {
            return Err(PolicyError::new(format!(
                "fixed_fraction: non-positive entry price for {}",
                candidate.symbol
            )));
        }
        let allocation = account.equity * self.fraction;
        let shares = (allocation / candidate.entry_price).floor() as u32;
        Ok(fit_to_cash(shares, candidate.entry_price, account.cash))
    }
}
