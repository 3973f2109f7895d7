//! Run artifacts: results JSON, trades CSV, equity CSV.
//!
//! Layout: `{output_dir}/{run_id}/` containing `results.json`, `trades.csv`,
//! and `equity.csv`. Row order is deterministic (close order / day order), so
//! two runs of the same configuration produce byte-identical files — the
//! machine-readable surface strategy-comparison tooling diffs against.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::runner::RunReport;

/// Where one run's artifacts landed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub results_json: PathBuf,
    pub trades_csv: PathBuf,
    pub equity_csv: PathBuf,
}

/// Write all artifacts for one run.
pub fn save_artifacts(output_dir: impl AsRef<Path>, report: &RunReport) -> Result<ArtifactPaths> {
    let dir = output_dir.as_ref().join(&report.run_id);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create artifact dir {}", dir.display()))?;

    let results_json = dir.join("results.json");
    let json = serde_json::to_string_pretty(report).context("failed to serialize results")?;
    fs::write(&results_json, json)
        .with_context(|| format!("failed to write {}", results_json.display()))?;

    let trades_csv = dir.join("trades.csv");
    write_trades_csv(&trades_csv, report)?;

    let equity_csv = dir.join("equity.csv");
    write_equity_csv(&equity_csv, report)?;

    Ok(ArtifactPaths {
        dir,
        results_json,
        trades_csv,
        equity_csv,
    })
}

fn write_trades_csv(path: &Path, report: &RunReport) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create trades CSV {}", path.display()))?;

    writeln!(
        file,
        "symbol,entry_date,entry_price,exit_date,exit_price,shares,pnl,reason,holding_days"
    )?;
    for trade in &report.results.trades {
        writeln!(
            file,
            "{},{},{:.4},{},{:.4},{},{:.4},{},{}",
            trade.symbol,
            trade.entry_date,
            trade.entry_price,
            trade.exit_date,
            trade.exit_price,
            trade.shares,
            trade.pnl,
            trade.reason.as_str(),
            trade.holding_days
        )?;
    }
    Ok(())
}

fn write_equity_csv(path: &Path, report: &RunReport) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create equity CSV {}", path.display()))?;

    writeln!(file, "date,equity")?;
    for point in &report.results.equity_curve {
        writeln!(file, "{},{:.4}", point.date, point.equity)?;
    }
    Ok(())
}
