//! Scanner trait — produces entry candidates for one simulated day.

pub mod breakout;
pub mod pullback;

pub use breakout::BreakoutScanner;
pub use pullback::PullbackScanner;

use super::PolicyError;
use crate::domain::Candidate;
use chrono::NaiveDate;

/// Entry scanner. Given a date, returns zero or more candidates.
///
/// Contract:
/// - Deterministic for a given date and underlying data.
/// - Candidates reference `date` as their scan date; the engine consumes them
///   the same day or not at all.
/// - A symbol the scanner cannot price (no data) is simply omitted — only
///   failures that invalidate the whole scan should surface as errors.
///
/// The engine re-sorts candidates into admission order (descending score,
/// symbol ascending) regardless of the order returned here.
pub trait Scanner: Send + Sync {
    /// Name used in configs, results, and artifact headers.
    fn strategy_name(&self) -> &str;

    fn scan(&self, date: NaiveDate) -> Result<Vec<Candidate>, PolicyError>;
}

/// A scanner that never signals. Useful as a baseline and in tests — a run
/// with no entries is a valid outcome, not an error.
pub struct NullScanner;

impl Scanner for NullScanner {
    fn strategy_name(&self) -> &str {
        "null"
    }

    fn scan(&self, _date: NaiveDate) -> Result<Vec<Candidate>, PolicyError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_scanner_never_signals() {
        let scanner = NullScanner;
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(scanner.scan(date).unwrap().is_empty());
        assert_eq!(scanner.strategy_name(), "null");
    }
}
