//! Strategy comparison — independent runs in parallel, plus trade diffing.
//!
//! Parallelism lives here and only here: each run owns its portfolio and
//! engine state, so fanning out *across* runs is safe, while the engine itself
//! stays strictly sequential within a run.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use swinglab_core::components::StrategyRegistry;
use swinglab_core::data::BarStore;
use swinglab_core::domain::Trade;
use swinglab_core::engine::CancelToken;

use crate::runner::{run_single, RunError, RunReport};
use crate::BacktestConfig;

/// Run every config against the same store, in parallel. Results come back in
/// input order regardless of completion order.
pub fn compare_runs(
    configs: &[BacktestConfig],
    store: Arc<dyn BarStore>,
    registry: &StrategyRegistry,
) -> Vec<Result<RunReport, RunError>> {
    let cancel = CancelToken::new();
    configs
        .par_iter()
        .map(|config| run_single(config, store.clone(), registry, &cancel))
        .collect()
}

/// Plain-text comparison table over successful runs.
pub fn comparison_table(reports: &[&RunReport]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<40} {:>10} {:>8} {:>9} {:>10} {:>7}\n",
        "strategy", "return%", "trades", "win%", "drawdown%", "sharpe"
    ));
    for report in reports {
        let m = &report.results.metrics;
        out.push_str(&format!(
            "{:<40} {:>10.2} {:>8} {:>9.2} {:>10.2} {:>7.2}\n",
            report.config.label(),
            m.total_return_pct,
            m.trade_count,
            m.win_rate_pct,
            m.max_drawdown_pct,
            m.sharpe,
        ));
    }
    out
}

/// Trades present in one run but not the other. Identity is the full record —
/// two trades differing in any field count as different.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeDiff {
    pub only_in_left: Vec<Trade>,
    pub only_in_right: Vec<Trade>,
}

impl TradeDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_left.is_empty() && self.only_in_right.is_empty()
    }
}

/// Diff two trade lists. Order-insensitive on matching, but the output
/// preserves each side's original ordering for readable reports.
pub fn diff_trades(left: &[Trade], right: &[Trade]) -> TradeDiff {
    let mut right_pool: Vec<&Trade> = right.iter().collect();
    let mut only_in_left = Vec::new();

    for trade in left {
        if let Some(pos) = right_pool.iter().position(|t| *t == trade) {
            right_pool.remove(pos);
        } else {
            only_in_left.push(trade.clone());
        }
    }

    TradeDiff {
        only_in_left,
        only_in_right: right_pool.into_iter().cloned().collect(),
    }
}
