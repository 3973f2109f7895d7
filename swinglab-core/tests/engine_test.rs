//! End-to-end engine scenarios with scripted components.
//!
//! These pin the engine's observable contract: clean-trade accounting,
//! capacity rejection diagnostics, partial-exit bookkeeping, zero-trade
//! safety, and deterministic serialized output.

use chrono::NaiveDate;
use std::sync::Mutex;

use swinglab_core::components::sizer::AccountState;
use swinglab_core::components::{ExitPolicy, PolicyError, PositionSizer, Scanner};
use swinglab_core::data::MemoryStore;
use swinglab_core::domain::{
    Bar, Candidate, ExitReason, ExitSignal, Position, PositionSize,
};
use swinglab_core::engine::{run_backtest, EngineConfig, SkipReason};

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

/// Emits a fixed candidate list on one scripted day, nothing otherwise.
struct OneDayScanner {
    on: NaiveDate,
    candidates: Vec<Candidate>,
}

impl Scanner for OneDayScanner {
    fn strategy_name(&self) -> &str {
        "scripted"
    }

    fn scan(&self, date: NaiveDate) -> Result<Vec<Candidate>, PolicyError> {
        if date == self.on {
            Ok(self.candidates.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

/// Replays a scripted sequence of exit signals keyed by date.
struct ScriptedExit {
    script: Mutex<Vec<(NaiveDate, ExitSignal)>>,
    partials: bool,
}

impl ScriptedExit {
    fn new(script: Vec<(NaiveDate, ExitSignal)>, partials: bool) -> Self {
        Self {
            script: Mutex::new(script),
            partials,
        }
    }
}

impl ExitPolicy for ScriptedExit {
    fn name(&self) -> &str {
        "scripted_exit"
    }

    fn initial_stop(&self, entry_price: f64) -> f64 {
        entry_price * 0.9
    }

    fn supports_partial_exits(&self) -> bool {
        self.partials
    }

    fn check_exit(
        &self,
        _position: &mut Position,
        _current_price: f64,
        current_date: NaiveDate,
        _recent_bars: &[Bar],
    ) -> Result<ExitSignal, PolicyError> {
        let mut script = self.script.lock().expect("script lock");
        if let Some(pos) = script.iter().position(|(d, _)| *d == current_date) {
            let (_, signal) = script.remove(pos);
            return Ok(signal);
        }
        Ok(ExitSignal::hold())
    }
}

/// Buys a fixed share count regardless of account state.
struct FixedShares(u32);

impl PositionSizer for FixedShares {
    fn name(&self) -> &str {
        "fixed_shares"
    }

    fn size(
        &self,
        _account: &AccountState,
        candidate: &Candidate,
    ) -> Result<PositionSize, PolicyError> {
        Ok(PositionSize::of(self.0, candidate.entry_price))
    }
}

fn store_with(symbols: &[(&str, f64)]) -> MemoryStore {
    let mut store = MemoryStore::new().with_daily("SPY", flat_bars(2, 12, 400.0));
    for (symbol, close) in symbols {
        store = store.with_daily(*symbol, flat_bars(2, 12, *close));
    }
    store
}

fn base_config() -> EngineConfig {
    EngineConfig::new(100_000.0, 5, day(2), day(12))
}

#[test]
fn single_clean_trade() {
    let store = store_with(&[("ACME", 100.0)]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![Candidate::new("ACME", day(3), 1.0).with_prices(100.0, 90.0)],
    };
    // Full exit at $110 three days after entry.
    let exit = ScriptedExit::new(
        vec![(day(6), ExitSignal::full(110.0, ExitReason::Target))],
        false,
    );

    let results = run_backtest(&store, &scanner, &exit, &FixedShares(100), &base_config()).unwrap();

    assert_eq!(results.trades.len(), 1);
    let trade = &results.trades[0];
    assert_eq!(trade.symbol, "ACME");
    assert_eq!(trade.shares, 100);
    assert!((trade.pnl - 1_000.0).abs() < 1e-9);
    assert_eq!(trade.entry_date, day(3));
    assert_eq!(trade.exit_date, day(6));
    assert_eq!(trade.holding_days, 3);
    assert!((results.ending_capital - 101_000.0).abs() < 1e-9);
    assert!((results.metrics.win_rate_pct - 100.0).abs() < 1e-9);
    assert_eq!(results.metrics.profit_factor, None); // no losers
}

#[test]
fn capacity_rejection_is_recorded() {
    let store = store_with(&[("AAA", 100.0), ("BBB", 100.0)]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![
            Candidate::new("AAA", day(3), 2.0).with_prices(100.0, 90.0),
            Candidate::new("BBB", day(3), 1.0).with_prices(100.0, 90.0),
        ],
    };
    let exit = ScriptedExit::new(Vec::new(), false);
    let config = EngineConfig::new(100_000.0, 1, day(2), day(12));

    let results = run_backtest(&store, &scanner, &exit, &FixedShares(10), &config).unwrap();

    // Exactly one position opened (the higher score), force-closed at the end.
    assert_eq!(results.trades.len(), 1);
    assert_eq!(results.trades[0].symbol, "AAA");
    assert_eq!(results.trades[0].reason, ExitReason::EndOfBacktest);

    // The second candidate is in diagnostics, not silently dropped.
    assert_eq!(results.diagnostics.skips_with_reason(&SkipReason::CapacityFull), 1);
    assert_eq!(
        results.diagnostics.skipped_candidates[0].candidate.symbol,
        "BBB"
    );
}

#[test]
fn partial_exit_accounting() {
    let store = store_with(&[("ACME", 100.0)]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![Candidate::new("ACME", day(3), 1.0).with_prices(100.0, 90.0)],
    };
    let exit = ScriptedExit::new(
        vec![
            (day(5), ExitSignal::partial(0.25, 108.0, ExitReason::Target)),
            (day(9), ExitSignal::full(120.0, ExitReason::TrailingStop)),
        ],
        true,
    );

    let results = run_backtest(&store, &scanner, &exit, &FixedShares(100), &base_config()).unwrap();

    assert_eq!(results.trades.len(), 2);
    let (first, second) = (&results.trades[0], &results.trades[1]);
    assert_eq!(first.shares + second.shares, 100);
    assert_eq!(first.shares, 25);
    assert_eq!(second.shares, 75);
    let expected_pnl = (108.0 - 100.0) * 25.0 + (120.0 - 100.0) * 75.0;
    let total_pnl: f64 = results.trades.iter().map(|t| t.pnl).sum();
    assert!((total_pnl - expected_pnl).abs() < 1e-9);
    assert!((results.ending_capital - (100_000.0 + expected_pnl)).abs() < 1e-9);
}

#[test]
fn partial_exit_demoted_without_support() {
    let store = store_with(&[("ACME", 100.0)]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![Candidate::new("ACME", day(3), 1.0).with_prices(100.0, 90.0)],
    };
    // Policy emits a partial but does NOT declare partial support: the engine
    // must promote it to a full exit.
    let exit = ScriptedExit::new(
        vec![(day(5), ExitSignal::partial(0.25, 108.0, ExitReason::Target))],
        false,
    );

    let results = run_backtest(&store, &scanner, &exit, &FixedShares(100), &base_config()).unwrap();

    assert_eq!(results.trades.len(), 1);
    assert_eq!(results.trades[0].shares, 100);
    assert_eq!(results.trades[0].exit_price, 108.0);
}

#[test]
fn zero_trade_run_is_safe() {
    let store = store_with(&[]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: Vec::new(),
    };
    let exit = ScriptedExit::new(Vec::new(), false);

    let results = run_backtest(&store, &scanner, &exit, &FixedShares(10), &base_config()).unwrap();

    assert_eq!(results.metrics.trade_count, 0);
    assert_eq!(results.metrics.win_rate_pct, 0.0);
    assert_eq!(results.metrics.max_drawdown_pct, 0.0);
    assert_eq!(results.ending_capital, 100_000.0);
}

#[test]
fn sizer_decline_is_recorded_not_retried() {
    let store = store_with(&[("ACME", 100.0)]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![Candidate::new("ACME", day(3), 1.0).with_prices(100.0, 90.0)],
    };
    let exit = ScriptedExit::new(Vec::new(), false);

    let results = run_backtest(&store, &scanner, &exit, &FixedShares(0), &base_config()).unwrap();

    assert_eq!(results.trades.len(), 0);
    assert_eq!(results.diagnostics.skips_with_reason(&SkipReason::SizerDeclined), 1);
}

#[test]
fn insufficient_cash_rejection_is_recorded() {
    let store = store_with(&[("ACME", 100.0)]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![Candidate::new("ACME", day(3), 1.0).with_prices(100.0, 90.0)],
    };
    let exit = ScriptedExit::new(Vec::new(), false);

    // 2,000 shares at $100 needs $200k against $100k of capital.
    let results = run_backtest(&store, &scanner, &exit, &FixedShares(2_000), &base_config()).unwrap();

    assert_eq!(results.trades.len(), 0);
    assert_eq!(
        results.diagnostics.skips_with_reason(&SkipReason::InsufficientCash),
        1
    );
}

#[test]
fn duplicate_symbol_candidates_skip_as_already_held() {
    let store = store_with(&[("ACME", 100.0)]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![
            Candidate::new("ACME", day(3), 2.0).with_prices(100.0, 90.0),
            Candidate::new("ACME", day(3), 1.0).with_prices(100.0, 90.0),
        ],
    };
    let exit = ScriptedExit::new(Vec::new(), false);

    let results = run_backtest(&store, &scanner, &exit, &FixedShares(10), &base_config()).unwrap();

    assert_eq!(results.trades.len(), 1);
    assert_eq!(results.diagnostics.skips_with_reason(&SkipReason::AlreadyHeld), 1);
}

#[test]
fn admission_follows_score_order_under_cash_pressure() {
    let store = store_with(&[("AAA", 100.0), ("BBB", 100.0), ("CCC", 100.0)]);
    // Same-day candidates; scores force admission order CCC > AAA > BBB.
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![
            Candidate::new("AAA", day(3), 5.0).with_prices(100.0, 90.0),
            Candidate::new("BBB", day(3), 1.0).with_prices(100.0, 90.0),
            Candidate::new("CCC", day(3), 9.0).with_prices(100.0, 90.0),
        ],
    };
    let exit = ScriptedExit::new(Vec::new(), false);
    // 600 shares * $100 = $60k per position: only one fits in $100k.
    let results = run_backtest(&store, &scanner, &exit, &FixedShares(600), &base_config()).unwrap();

    assert_eq!(results.trades.len(), 1);
    assert_eq!(results.trades[0].symbol, "CCC");
    assert_eq!(
        results.diagnostics.skips_with_reason(&SkipReason::InsufficientCash),
        2
    );
}

#[test]
fn determinism_byte_identical_results() {
    let run = || {
        let store = store_with(&[("AAA", 100.0), ("BBB", 250.0)]);
        let scanner = OneDayScanner {
            on: day(3),
            candidates: vec![
                Candidate::new("AAA", day(3), 2.0).with_prices(100.0, 90.0),
                Candidate::new("BBB", day(3), 2.0).with_prices(250.0, 230.0),
            ],
        };
        let exit = ScriptedExit::new(
            vec![(day(8), ExitSignal::full(105.0, ExitReason::TimeLimit))],
            false,
        );
        run_backtest(&store, &scanner, &exit, &FixedShares(50), &base_config()).unwrap()
    };

    let a = serde_json::to_string(&run()).unwrap();
    let b = serde_json::to_string(&run()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn conservation_holds_end_to_end() {
    let store = store_with(&[("AAA", 100.0), ("BBB", 50.0)]);
    let scanner = OneDayScanner {
        on: day(3),
        candidates: vec![
            Candidate::new("AAA", day(3), 2.0).with_prices(100.0, 90.0),
            Candidate::new("BBB", day(3), 1.0).with_prices(50.0, 45.0),
        ],
    };
    let exit = ScriptedExit::new(
        vec![(day(7), ExitSignal::full(104.0, ExitReason::Target))],
        false,
    );

    let results = run_backtest(&store, &scanner, &exit, &FixedShares(100), &base_config()).unwrap();

    // All positions are closed by the terminal force-close, so:
    // ending capital == starting capital + sum of realized P&L.
    let realized: f64 = results.trades.iter().map(|t| t.pnl).sum();
    assert!((results.ending_capital - (100_000.0 + realized)).abs() < 1e-6);
}
