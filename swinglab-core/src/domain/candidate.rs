//! Candidate — an entry signal produced by a Scanner.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A proposed trade entry for one simulated day.
///
/// Immutable once produced. The engine either consumes it (sizes and opens a
/// position) or records why it was skipped; it is never carried to a later day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub scan_date: NaiveDate,
    /// Scanner-assigned ranking score. Higher is better.
    pub score: f64,
    pub entry_price: f64,
    /// Suggested initial stop. A non-positive value defers to the exit policy.
    pub stop_price: f64,
    pub target_price: Option<f64>,
    /// Strategy-specific annotations, keyed deterministically.
    pub metadata: BTreeMap<String, String>,
}

impl Candidate {
    pub fn new(symbol: impl Into<String>, scan_date: NaiveDate, score: f64) -> Self {
        Self {
            symbol: symbol.into(),
            scan_date,
            score,
            entry_price: 0.0,
            stop_price: 0.0,
            target_price: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_prices(mut self, entry: f64, stop: f64) -> Self {
        self.entry_price = entry;
        self.stop_price = stop;
        self
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target_price = Some(target);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Sort candidates into admission order: descending score, ties broken by
/// ascending symbol. Admission order is part of the engine contract — cash and
/// capacity constraints make it observable in Results.
pub fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}
