//! Run summary rendering for the CLI surface.

use crate::runner::RunReport;

/// Human-readable summary: the engine's own summary block plus run identity
/// and diagnostics counts.
pub fn render_summary(report: &RunReport) -> String {
    let results = &report.results;
    let diag = &results.diagnostics;
    let mut out = String::new();

    out.push_str(&format!("Run {}\n", &report.run_id[..16]));
    out.push_str(&results.summary());
    out.push_str(&format!(
        "Skipped candidates: {} | faults: {} | data gaps: {}\n",
        diag.skipped_candidates.len(),
        diag.policy_faults.len(),
        diag.data_gaps.len(),
    ));
    out
}
