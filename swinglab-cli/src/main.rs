//! SwingLab CLI — run, compare, download, and cache commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config, print the summary, save artifacts
//! - `compare` — run several configs in parallel and print a comparison table
//! - `download` — prefetch daily bars into the Parquet cache
//! - `cache status` — list cached entries

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use swinglab_core::components::StrategyRegistry;
use swinglab_core::data::{BarStore, CachingStore, CsvStore, SyntheticStore, YahooStore};
use swinglab_core::engine::CancelToken;
use swinglab_runner::{
    compare_runs, comparison_table, diff_trades, render_summary, run_single, save_artifacts,
    BacktestConfig,
};

#[derive(Parser)]
#[command(name = "swinglab", about = "SwingLab — scanner-driven backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        config: PathBuf,

        /// Bar cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Offline mode: read bars from CSV fixtures in the cache directory
        /// instead of the network.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Use seeded synthetic data instead of any real source.
        #[arg(long)]
        synthetic_seed: Option<u64>,

        /// Output directory for artifacts (results.json, trades.csv, equity.csv).
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run several configs against the same data and compare them.
    Compare {
        /// Paths to TOML config files (two or more).
        #[arg(required = true, num_args = 2..)]
        configs: Vec<PathBuf>,

        /// Bar cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Offline mode: CSV fixtures instead of the network.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Use seeded synthetic data instead of any real source.
        #[arg(long)]
        synthetic_seed: Option<u64>,

        /// Also print the trade-level diff between the first two runs.
        #[arg(long, default_value_t = false)]
        diff: bool,
    },
    /// Prefetch daily bars into the Parquet cache.
    Download {
        /// Symbols to download (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Bar cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached entries with bar counts.
    Status {
        /// Bar cache directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            cache_dir,
            offline,
            synthetic_seed,
            output_dir,
        } => cmd_run(&config, &cache_dir, offline, synthetic_seed, &output_dir),
        Commands::Compare {
            configs,
            cache_dir,
            offline,
            synthetic_seed,
            diff,
        } => cmd_compare(&configs, &cache_dir, offline, synthetic_seed, diff),
        Commands::Download {
            symbols,
            start,
            end,
            cache_dir,
        } => cmd_download(&symbols, &start, &end, &cache_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => cmd_cache_status(&cache_dir),
        },
    }
}

/// Build the store stack: base source wrapped in the Parquet cache.
fn build_store(
    cache_dir: &PathBuf,
    offline: bool,
    synthetic_seed: Option<u64>,
) -> Arc<dyn BarStore> {
    let base: Arc<dyn BarStore> = if let Some(seed) = synthetic_seed {
        Arc::new(SyntheticStore::new(seed))
    } else if offline {
        Arc::new(CsvStore::new(cache_dir.clone()))
    } else {
        Arc::new(YahooStore::new())
    };
    Arc::new(CachingStore::new(base, cache_dir.clone()))
}

fn cmd_run(
    config_path: &PathBuf,
    cache_dir: &PathBuf,
    offline: bool,
    synthetic_seed: Option<u64>,
    output_dir: &PathBuf,
) -> Result<()> {
    let config = BacktestConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let store = build_store(cache_dir, offline, synthetic_seed);
    let registry = StrategyRegistry::with_builtins();

    let report = run_single(&config, store, &registry, &CancelToken::new())?;
    print!("{}", render_summary(&report));

    let paths = save_artifacts(output_dir, &report)?;
    println!("Artifacts written to {}", paths.dir.display());
    Ok(())
}

fn cmd_compare(
    config_paths: &[PathBuf],
    cache_dir: &PathBuf,
    offline: bool,
    synthetic_seed: Option<u64>,
    diff: bool,
) -> Result<()> {
    let mut configs = Vec::with_capacity(config_paths.len());
    for path in config_paths {
        configs.push(
            BacktestConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        );
    }
    let store = build_store(cache_dir, offline, synthetic_seed);
    let registry = StrategyRegistry::with_builtins();

    let outcomes = compare_runs(&configs, store, &registry);
    let mut reports = Vec::new();
    for (path, outcome) in config_paths.iter().zip(outcomes) {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => eprintln!("FAIL {}: {e}", path.display()),
        }
    }
    if reports.is_empty() {
        bail!("no runs succeeded");
    }

    let refs: Vec<&swinglab_runner::RunReport> = reports.iter().collect();
    print!("{}", comparison_table(&refs));

    if diff {
        if reports.len() < 2 {
            bail!("--diff needs at least two successful runs");
        }
        let trade_diff = diff_trades(&reports[0].results.trades, &reports[1].results.trades);
        if trade_diff.is_empty() {
            println!("\nTrade lists are identical.");
        } else {
            println!(
                "\nTrades only in {}: {}",
                reports[0].config.label(),
                serde_json::to_string_pretty(&trade_diff.only_in_left)?
            );
            println!(
                "Trades only in {}: {}",
                reports[1].config.label(),
                serde_json::to_string_pretty(&trade_diff.only_in_right)?
            );
        }
    }
    Ok(())
}

fn cmd_download(symbols: &[String], start: &str, end: &str, cache_dir: &PathBuf) -> Result<()> {
    let start: NaiveDate = start.parse().context("invalid --start date")?;
    let end: NaiveDate = end.parse().context("invalid --end date")?;
    if start > end {
        bail!("--start must not be after --end");
    }

    let store = build_store(cache_dir, false, None);
    let total = symbols.len();
    let mut failed = 0;
    for (i, symbol) in symbols.iter().enumerate() {
        println!("[{}/{total}] Fetching {symbol}...", i + 1);
        match store.fetch_daily_bars(symbol, start, end) {
            Ok(bars) => println!("  OK: {symbol} ({} bars)", bars.len()),
            Err(e) => {
                failed += 1;
                println!("  FAIL: {symbol}: {e}");
            }
        }
    }
    println!("\nDownload complete: {}/{total} succeeded, {failed} failed", total - failed);
    Ok(())
}

fn cmd_cache_status(cache_dir: &PathBuf) -> Result<()> {
    // A no-op inner store: status only reads sidecar metadata.
    let inner: Arc<dyn BarStore> = Arc::new(SyntheticStore::new(0));
    let cache = CachingStore::new(inner, cache_dir.clone());

    let entries = cache.status();
    if entries.is_empty() {
        println!("Cache at {} is empty.", cache_dir.display());
        return Ok(());
    }
    println!("{:<10} {:<32} {:>8}  cached at", "symbol", "key", "bars");
    for meta in entries {
        println!(
            "{:<10} {:<32} {:>8}  {}",
            meta.symbol, meta.key, meta.bar_count, meta.cached_at
        );
    }
    Ok(())
}
