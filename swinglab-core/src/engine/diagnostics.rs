//! Run diagnostics — the structured record of everything that didn't trade.
//!
//! Skipped candidates, component faults, and data gaps are normal outcomes of
//! a run and belong in its results, not in a log stream. Serialized with the
//! rest of the results so run-to-run diffs surface behavioral changes.

use crate::domain::{Candidate, OpenRejection};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Why a candidate did not become a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// Open-position count was already at the maximum.
    CapacityFull,
    /// Required cash exceeded available cash.
    InsufficientCash,
    /// The sizer returned zero shares.
    SizerDeclined,
    /// A position in this symbol is already open.
    AlreadyHeld,
}

impl From<OpenRejection> for SkipReason {
    fn from(rejection: OpenRejection) -> Self {
        match rejection {
            OpenRejection::CapacityFull => Self::CapacityFull,
            OpenRejection::InsufficientCash { .. } => Self::InsufficientCash,
        }
    }
}

/// A candidate the engine declined, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub candidate: Candidate,
    pub reason: SkipReason,
}

/// Which component raised the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStage {
    Scanner,
    ExitPolicy,
    Sizer,
}

/// One caught component failure: symbol + date + summary, run continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyFault {
    pub date: NaiveDate,
    pub symbol: Option<String>,
    pub stage: PolicyStage,
    pub message: String,
}

/// Why a run ended before its final day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbortInfo {
    pub date: NaiveDate,
    pub reason: String,
}

/// Accumulated diagnostics for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub skipped_candidates: Vec<SkippedCandidate>,
    pub policy_faults: Vec<PolicyFault>,
    /// (date, symbol) pairs where the store had no bar. Recorded once per pair.
    pub data_gaps: BTreeSet<(NaiveDate, String)>,
    /// Set when the run stopped early (fault budget or cancellation).
    pub aborted: Option<AbortInfo>,
}

impl RunDiagnostics {
    pub fn record_skip(&mut self, candidate: Candidate, reason: SkipReason) {
        self.skipped_candidates.push(SkippedCandidate { candidate, reason });
    }

    pub fn record_fault(
        &mut self,
        date: NaiveDate,
        symbol: Option<String>,
        stage: PolicyStage,
        message: impl Into<String>,
    ) {
        self.policy_faults.push(PolicyFault {
            date,
            symbol,
            stage,
            message: message.into(),
        });
    }

    /// Record a missing bar once; returns true if this is the first sighting
    /// (callers use that to log exactly once).
    pub fn record_data_gap(&mut self, date: NaiveDate, symbol: &str) -> bool {
        self.data_gaps.insert((date, symbol.to_string()))
    }

    pub fn skips_with_reason(&self, reason: &SkipReason) -> usize {
        self.skipped_candidates
            .iter()
            .filter(|s| s.reason == *reason)
            .count()
    }
}
