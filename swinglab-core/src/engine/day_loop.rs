//! Day-by-day backtest loop — the heart of the engine.
//!
//! Per simulated day, in this order:
//! 1. Exit evaluation for every open position, oldest first
//! 2. Scan for new candidates
//! 3. Admit candidates by descending score while capacity and cash remain
//! 4. Mark-to-market (exactly once)
//!
//! After the last day, still-open positions are force-closed at the last known
//! close with reason END_OF_BACKTEST, then metrics are derived.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::components::sizer::AccountState;
use crate::components::{ExitPolicy, PositionSizer, Scanner};
use crate::data::{BarStore, DataError};
use crate::domain::{sort_candidates, ExitReason, ExitSignal, Portfolio};
use crate::metrics::MetricsReport;

use super::config::{CancelToken, ConfigError, EngineConfig};
use super::diagnostics::{AbortInfo, PolicyStage, RunDiagnostics, SkipReason};
use super::results::{Results, RESULTS_SCHEMA_VERSION};
use super::series::SeriesCache;

/// Failures that prevent a run from starting at all. Everything that can go
/// wrong *during* the loop degrades gracefully into diagnostics instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("trading calendar unavailable ({symbol}): {source}")]
    Calendar {
        symbol: String,
        #[source]
        source: DataError,
    },
}

/// Run a backtest to completion (or cancellation).
pub fn run_backtest(
    store: &dyn BarStore,
    scanner: &dyn Scanner,
    exit_policy: &dyn ExitPolicy,
    sizer: &dyn PositionSizer,
    config: &EngineConfig,
) -> Result<Results, EngineError> {
    run_backtest_with_cancel(store, scanner, exit_policy, sizer, config, &CancelToken::new())
}

pub fn run_backtest_with_cancel(
    store: &dyn BarStore,
    scanner: &dyn Scanner,
    exit_policy: &dyn ExitPolicy,
    sizer: &dyn PositionSizer,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<Results, EngineError> {
    config.validate()?;

    // The calendar symbol's trading days drive the simulation. Without them
    // there is nothing to iterate, so this one fetch is allowed to fail hard.
    let calendar = store
        .fetch_daily_bars(&config.calendar_symbol, config.start, config.end)
        .map_err(|source| EngineError::Calendar {
            symbol: config.calendar_symbol.clone(),
            source,
        })?;
    let days: Vec<NaiveDate> = calendar.iter().map(|b| b.date).collect();

    let fetch_start = config.start - chrono::Duration::days(config.warmup_days);
    let mut series = SeriesCache::new(store, fetch_start, config.end);
    let mut portfolio = Portfolio::new(config.starting_capital, config.max_positions);
    let mut diagnostics = RunDiagnostics::default();
    let mut last_close: HashMap<String, f64> = HashMap::new();
    let mut consecutive_faults = 0usize;

    let honor_partials = exit_policy.supports_partial_exits();

    'days: for &day in &days {
        if cancel.is_cancelled() {
            diagnostics.aborted = Some(AbortInfo {
                date: day,
                reason: "cancelled".to_string(),
            });
            break 'days;
        }

        // ── Phase 1: exit evaluation, oldest position first ──
        // Exits free cash before the same-day admission below, and the fixed
        // order keeps cash-constrained admission deterministic.
        for id in portfolio.open_ids() {
            let Some(symbol) = portfolio.position(id).map(|p| p.symbol.clone()) else {
                continue;
            };
            let bars = match series.bars_up_to(&symbol, day) {
                Ok(bars) => bars,
                Err(_) => {
                    if diagnostics.record_data_gap(day, &symbol) {
                        eprintln!("WARNING: no data for {symbol} on {day}; holding position");
                    }
                    continue;
                }
            };
            // No bar today (halt, missing day): carry the position untouched.
            let Some(today) = bars.last().filter(|b| b.date == day) else {
                if diagnostics.record_data_gap(day, &symbol) {
                    eprintln!("WARNING: no bar for {symbol} on {day}; holding position");
                }
                continue;
            };
            let price = today.close;
            last_close.insert(symbol.clone(), price);

            let position = portfolio.position_mut(id).expect("id came from open_ids");
            let signal = match exit_policy.check_exit(position, price, day, bars) {
                Ok(signal) => {
                    consecutive_faults = 0;
                    signal
                }
                Err(fault) => {
                    diagnostics.record_fault(
                        day,
                        Some(symbol.clone()),
                        PolicyStage::ExitPolicy,
                        fault.message,
                    );
                    consecutive_faults += 1;
                    if fault_budget_exhausted(config, consecutive_faults) {
                        diagnostics.aborted = Some(abort_on_faults(day, consecutive_faults));
                        break 'days;
                    }
                    continue;
                }
            };

            if signal.should_exit {
                // A policy that doesn't declare partial-exit support gets its
                // fractions promoted to full exits.
                let signal = if signal.is_full() || honor_partials {
                    signal
                } else {
                    ExitSignal::full(signal.exit_price, signal.reason.unwrap_or(ExitReason::StopLoss))
                };
                portfolio.apply_exit(id, &signal, day);
            }
        }

        // ── Phase 2: scan ──
        let mut candidates = match scanner.scan(day) {
            Ok(candidates) => {
                consecutive_faults = 0;
                candidates
            }
            Err(fault) => {
                diagnostics.record_fault(day, None, PolicyStage::Scanner, fault.message);
                consecutive_faults += 1;
                if fault_budget_exhausted(config, consecutive_faults) {
                    diagnostics.aborted = Some(abort_on_faults(day, consecutive_faults));
                    break 'days;
                }
                Vec::new()
            }
        };
        sort_candidates(&mut candidates);

        // ── Phase 3: admission, best score first ──
        for candidate in candidates {
            if portfolio.has_position(&candidate.symbol) {
                diagnostics.record_skip(candidate, SkipReason::AlreadyHeld);
                continue;
            }
            if portfolio.open_count() >= config.max_positions {
                // Not silently dropped: capacity rejections are part of the
                // run's diagnostics contract.
                diagnostics.record_skip(candidate, SkipReason::CapacityFull);
                continue;
            }

            let account = AccountState {
                cash: portfolio.cash(),
                equity: portfolio.last_equity(),
                open_positions: portfolio.open_count(),
                max_positions: config.max_positions,
            };
            let size = match sizer.size(&account, &candidate) {
                Ok(size) => {
                    consecutive_faults = 0;
                    size
                }
                Err(fault) => {
                    diagnostics.record_fault(
                        day,
                        Some(candidate.symbol.clone()),
                        PolicyStage::Sizer,
                        fault.message,
                    );
                    consecutive_faults += 1;
                    if fault_budget_exhausted(config, consecutive_faults) {
                        diagnostics.aborted = Some(abort_on_faults(day, consecutive_faults));
                        break 'days;
                    }
                    continue;
                }
            };
            if size.is_skip() {
                diagnostics.record_skip(candidate, SkipReason::SizerDeclined);
                continue;
            }

            let stop = if candidate.stop_price > 0.0 {
                candidate.stop_price
            } else {
                exit_policy.initial_stop(candidate.entry_price)
            };
            let entry_price = candidate.entry_price;
            let symbol = candidate.symbol.clone();
            match portfolio.open_position(&candidate, &size, stop, day) {
                Ok(_) => {
                    last_close.insert(symbol, entry_price);
                }
                Err(rejection) => {
                    diagnostics.record_skip(candidate, rejection.into());
                }
            }
        }

        // ── Phase 4: mark-to-market, exactly once ──
        let open_symbols: Vec<String> = portfolio
            .open_positions()
            .iter()
            .map(|p| p.symbol.clone())
            .collect();
        for symbol in open_symbols {
            if let Some(bar) = series.bar_on(&symbol, day) {
                last_close.insert(symbol, bar.close);
            }
        }
        portfolio.mark_to_market(day, &last_close);
    }

    // ── Terminal: force-close survivors at the last known close ──
    if diagnostics.aborted.is_none() {
        if let Some(&last_day) = days.last() {
            for id in portfolio.open_ids() {
                let Some(position) = portfolio.position(id) else {
                    continue;
                };
                let price = last_close
                    .get(&position.symbol)
                    .copied()
                    .unwrap_or(position.entry_price);
                portfolio.apply_exit(id, &ExitSignal::full(price, ExitReason::EndOfBacktest), last_day);
            }
        }
    }

    // Aborted runs may still hold positions; report marked equity rather than
    // bare cash so open value isn't thrown away.
    let ending_capital = if portfolio.open_count() > 0 {
        portfolio.last_equity()
    } else {
        portfolio.cash()
    };

    let metrics = MetricsReport::compute(
        config.starting_capital,
        portfolio.trades(),
        portfolio.equity_curve(),
    );

    Ok(Results {
        schema_version: RESULTS_SCHEMA_VERSION,
        scanner_name: scanner.strategy_name().to_string(),
        exit_name: exit_policy.name().to_string(),
        sizer_name: sizer.name().to_string(),
        start: config.start,
        end: config.end,
        starting_capital: config.starting_capital,
        ending_capital,
        days_simulated: portfolio.equity_curve().len(),
        equity_curve: portfolio.equity_curve().to_vec(),
        trades: portfolio.trades().to_vec(),
        metrics,
        diagnostics,
    })
}

fn fault_budget_exhausted(config: &EngineConfig, consecutive_faults: usize) -> bool {
    config
        .max_consecutive_faults
        .is_some_and(|budget| consecutive_faults >= budget)
}

fn abort_on_faults(date: NaiveDate, count: usize) -> AbortInfo {
    AbortInfo {
        date,
        reason: format!("fault budget exhausted after {count} consecutive faults"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::scanner::NullScanner;
    use crate::components::PolicyError;
    use crate::data::MemoryStore;
    use crate::domain::{Bar, Candidate, Position, PositionSize};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn flat_bars(from: u32, to: u32, close: f64) -> Vec<Bar> {
        (from..=to)
            .map(|d| Bar {
                date: day(d),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10_000,
            })
            .collect()
    }

    struct NeverExit;

    impl ExitPolicy for NeverExit {
        fn name(&self) -> &str {
            "never"
        }

        fn initial_stop(&self, entry_price: f64) -> f64 {
            entry_price * 0.9
        }

        fn check_exit(
            &self,
            _position: &mut Position,
            _current_price: f64,
            _current_date: NaiveDate,
            _recent_bars: &[Bar],
        ) -> Result<ExitSignal, PolicyError> {
            Ok(ExitSignal::hold())
        }
    }

    struct AllInSizer;

    impl PositionSizer for AllInSizer {
        fn name(&self) -> &str {
            "all_in"
        }

        fn size(
            &self,
            account: &AccountState,
            candidate: &Candidate,
        ) -> Result<PositionSize, PolicyError> {
            let shares = (account.cash / candidate.entry_price).floor() as u32;
            Ok(PositionSize::of(shares, candidate.entry_price))
        }
    }

    fn config(from: u32, to: u32) -> EngineConfig {
        EngineConfig::new(100_000.0, 3, day(from), day(to)).with_calendar_symbol("SPY")
    }

    #[test]
    fn null_scanner_produces_flat_run() {
        let store = MemoryStore::new().with_daily("SPY", flat_bars(2, 12, 400.0));
        let results = run_backtest(&store, &NullScanner, &NeverExit, &AllInSizer, &config(2, 12))
            .unwrap();

        assert_eq!(results.metrics.trade_count, 0);
        assert_eq!(results.metrics.win_rate_pct, 0.0);
        assert_eq!(results.ending_capital, 100_000.0);
        assert_eq!(results.days_simulated, 11);
        assert!(results.equity_curve.iter().all(|p| p.equity == 100_000.0));
    }

    #[test]
    fn invalid_config_fails_before_loop() {
        let store = MemoryStore::new();
        let err = run_backtest(
            &store,
            &NullScanner,
            &NeverExit,
            &AllInSizer,
            &EngineConfig::new(-5.0, 3, day(2), day(12)),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn missing_calendar_is_fatal() {
        let store = MemoryStore::new(); // no SPY
        let err = run_backtest(&store, &NullScanner, &NeverExit, &AllInSizer, &config(2, 12))
            .unwrap_err();
        assert!(matches!(err, EngineError::Calendar { .. }));
    }

    #[test]
    fn cancelled_run_returns_partial_results() {
        let store = MemoryStore::new().with_daily("SPY", flat_bars(2, 12, 400.0));
        let token = CancelToken::new();
        token.cancel();
        let results = run_backtest_with_cancel(
            &store,
            &NullScanner,
            &NeverExit,
            &AllInSizer,
            &config(2, 12),
            &token,
        )
        .unwrap();
        assert_eq!(results.days_simulated, 0);
        assert!(results.diagnostics.aborted.is_some());
    }

    struct FaultingScanner;

    impl Scanner for FaultingScanner {
        fn strategy_name(&self) -> &str {
            "faulting"
        }

        fn scan(&self, _date: NaiveDate) -> Result<Vec<Candidate>, PolicyError> {
            Err(PolicyError::new("scanner exploded"))
        }
    }

    #[test]
    fn fault_budget_aborts_with_partial_results() {
        let store = MemoryStore::new().with_daily("SPY", flat_bars(2, 12, 400.0));
        let cfg = config(2, 12).with_fault_budget(Some(3));
        let results =
            run_backtest(&store, &FaultingScanner, &NeverExit, &AllInSizer, &cfg).unwrap();

        let abort = results.diagnostics.aborted.as_ref().expect("must abort");
        assert_eq!(abort.date, day(4)); // third consecutive fault
        assert_eq!(results.diagnostics.policy_faults.len(), 3);
        // Two full days were marked before the aborting day.
        assert_eq!(results.days_simulated, 2);
    }

    #[test]
    fn faults_without_budget_never_abort() {
        let store = MemoryStore::new().with_daily("SPY", flat_bars(2, 12, 400.0));
        let cfg = config(2, 12).with_fault_budget(None);
        let results =
            run_backtest(&store, &FaultingScanner, &NeverExit, &AllInSizer, &cfg).unwrap();
        assert!(results.diagnostics.aborted.is_none());
        assert_eq!(results.diagnostics.policy_faults.len(), 11);
        assert_eq!(results.days_simulated, 11);
    }
}
