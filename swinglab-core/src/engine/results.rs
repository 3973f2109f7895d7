//! Results — the immutable output of one backtest run.

use super::diagnostics::RunDiagnostics;
use crate::domain::{EquityPoint, Trade};
use crate::metrics::MetricsReport;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Schema version for persisted results, bumped on breaking field changes.
pub const RESULTS_SCHEMA_VERSION: u32 = 1;

/// Aggregate output of one engine run. Produced once, immutable thereafter.
///
/// The trade list and equity curve are in deterministic order (close order and
/// day order respectively), so serializing two runs of the same configuration
/// yields byte-identical JSON — the contract strategy-comparison tooling diffs
/// against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub scanner_name: String,
    pub exit_name: String,
    pub sizer_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub starting_capital: f64,
    pub ending_capital: f64,
    pub days_simulated: usize,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub metrics: MetricsReport,
    pub diagnostics: RunDiagnostics,
}

fn default_schema_version() -> u32 {
    RESULTS_SCHEMA_VERSION
}

impl Results {
    /// Human-readable run summary for the CLI/report surface.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Backtest {} .. {}", self.start, self.end);
        let _ = writeln!(
            out,
            "Strategy: {} / {} / {}",
            self.scanner_name, self.exit_name, self.sizer_name
        );
        let _ = writeln!(out, "Starting capital: {:>14.2}", self.starting_capital);
        let _ = writeln!(out, "Ending capital:   {:>14.2}", self.ending_capital);
        let _ = writeln!(out, "Total return:     {:>13.2}%", self.metrics.total_return_pct);
        let _ = writeln!(out, "Trades:           {:>10}", self.metrics.trade_count);
        let _ = writeln!(out, "Win rate:         {:>13.2}%", self.metrics.win_rate_pct);
        match self.metrics.profit_factor {
            Some(pf) => {
                let _ = writeln!(out, "Profit factor:    {:>14.2}", pf);
            }
            None => {
                let _ = writeln!(out, "Profit factor:    {:>14}", "n/a");
            }
        }
        let _ = writeln!(out, "Max drawdown:     {:>13.2}%", self.metrics.max_drawdown_pct);
        let _ = writeln!(out, "Expectancy:       {:>14.2}", self.metrics.expectancy);
        let _ = writeln!(out, "Avg hold days:    {:>14.2}", self.metrics.avg_hold_days);
        if let Some(abort) = &self.diagnostics.aborted {
            let _ = writeln!(out, "ABORTED on {}: {}", abort.date, abort.reason);
        }
        out
    }
}
