//! Fixed-dollar sizer: each position targets a flat cash amount.

use super::{fit_to_cash, AccountState, PositionSizer};
use crate::components::PolicyError;
use crate::domain::{Candidate, PositionSize};

pub struct FixedDollarSizer {
    pub amount: f64,
}

impl FixedDollarSizer {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }
}

impl PositionSizer for FixedDollarSizer {
    fn name(&self) -> &str {
        "fixed_dollar"
    }

    fn size(
        &self,
        account: &AccountState,
        candidate: &Candidate,
    ) -> Result<PositionSize, PolicyError> {
        if candidate.entry_price <= 0.0 {
            return Err(PolicyError::new(format!(
                "fixed_dollar: non-positive entry price for {}",
                candidate.symbol
            )));
        }
        let shares = (self.amount / candidate.entry_price).floor() as u32;
        Ok(fit_to_cash(shares, candidate.entry_price, account.cash))
    }
}
