//! Backtest runner — wires config, registry, store, and engine together.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use swinglab_core::components::{RegistryError, ScannerContext, StrategyRegistry};
use swinglab_core::data::BarStore;
use swinglab_core::engine::{run_backtest_with_cancel, CancelToken, EngineError, Results};

use crate::config::{BacktestConfig, RunId};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("component error: {0}")]
    Registry(#[from] RegistryError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// A finished run: the config that produced it, its id, and the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub results: Results,
}

/// Build the strategy from the registry and run it to completion.
///
/// Each call owns its portfolio and engine state, so callers may run many of
/// these concurrently (see [`crate::compare`]) as long as each gets its own
/// invocation.
pub fn run_single(
    config: &BacktestConfig,
    store: Arc<dyn BarStore>,
    registry: &StrategyRegistry,
    cancel: &CancelToken,
) -> Result<RunReport, RunError> {
    let ctx = ScannerContext {
        store: store.clone(),
        universe: config.backtest.universe.clone(),
    };
    let scanner = registry.create_scanner(&config.scanner, &ctx)?;
    let exit_policy = registry.create_exit(&config.exit)?;
    let sizer = registry.create_sizer(&config.sizer)?;

    let engine_config = config.to_engine_config();
    let results = run_backtest_with_cancel(
        store.as_ref(),
        scanner.as_ref(),
        exit_policy.as_ref(),
        sizer.as_ref(),
        &engine_config,
        cancel,
    )?;

    Ok(RunReport {
        run_id: config.run_id(),
        config: config.clone(),
        results,
    })
}
