//! Parquet cache decorator over any BarStore.
//!
//! Layout: `{cache_dir}/symbol={SYMBOL}/daily_{start}_{end}.parquet` and
//! `{cache_dir}/symbol={SYMBOL}/intraday_{date}_{interval}.parquet`. The cache
//! key is exactly `(symbol, start, end, granularity)` — a hit deserializes into
//! the same `Bar`/`IntradayBar` types a live fetch produces.
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Metadata sidecar per entry (bar count, content hash, cached-at)
//! - Integrity validation on load (schema check, row count > 0)
//! - Quarantine for corrupt files ({filename}.quarantined) — corruption is a
//!   cache miss, never a fatal error

use super::store::{BarInterval, BarStore, DataError};
use crate::domain::{Bar, IntradayBar};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata sidecar for one cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub key: String,
    pub bar_count: usize,
    pub data_hash: String,
    pub cached_at: chrono::NaiveDateTime,
}

/// Caching decorator. Misses fall through to the inner store and persist the
/// result; hits never touch the inner store.
pub struct CachingStore {
    inner: Arc<dyn BarStore>,
    cache_dir: PathBuf,
}

impl CachingStore {
    pub fn new(inner: Arc<dyn BarStore>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("symbol={symbol}"))
    }

    fn daily_path(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
        self.symbol_dir(symbol)
            .join(format!("daily_{start}_{end}.parquet"))
    }

    fn intraday_path(&self, symbol: &str, date: NaiveDate, interval: BarInterval) -> PathBuf {
        self.symbol_dir(symbol)
            .join(format!("intraday_{date}_{}.parquet", interval.as_str()))
    }

    fn meta_path(path: &Path) -> PathBuf {
        path.with_extension("parquet.meta.json")
    }

    /// Quarantine a corrupt cache file so the next run refetches cleanly.
    fn quarantine(path: &Path, err: &DataError) {
        let quarantined = path.with_extension("parquet.quarantined");
        eprintln!(
            "WARNING: quarantining corrupt cache file {}: {err}",
            path.display()
        );
        let _ = fs::rename(path, &quarantined);
        let _ = fs::remove_file(Self::meta_path(path));
    }

    fn write_entry(&self, symbol: &str, key: &str, path: &Path, df: &DataFrame, bar_count: usize, hash_input: &[u8]) -> Result<(), DataError> {
        let dir = path.parent().expect("cache paths always have a parent");
        fs::create_dir_all(dir).map_err(|e| DataError::Cache(format!("failed to create dir: {e}")))?;

        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(df, &tmp_path)?;
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Cache(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            key: key.to_string(),
            bar_count,
            data_hash: blake3::hash(hash_input).to_hex().to_string(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Cache(format!("meta serialization: {e}")))?;
        fs::write(Self::meta_path(path), meta_json)
            .map_err(|e| DataError::Cache(format!("meta write: {e}")))?;
        Ok(())
    }

    /// All cache entry metadata, sorted by symbol then key.
    pub fn status(&self) -> Vec<CacheMeta> {
        let mut entries = Vec::new();
        let Ok(dirs) = fs::read_dir(&self.cache_dir) else {
            return entries;
        };
        for dir in dirs.flatten() {
            let Ok(files) = fs::read_dir(dir.path()) else {
                continue;
            };
            for file in files.flatten() {
                let path = file.path();
                if path.to_string_lossy().ends_with(".meta.json") {
                    if let Ok(content) = fs::read_to_string(&path) {
                        if let Ok(meta) = serde_json::from_str::<CacheMeta>(&content) {
                            entries.push(meta);
                        }
                    }
                }
            }
        }
        entries.sort_by(|a, b| a.symbol.cmp(&b.symbol).then_with(|| a.key.cmp(&b.key)));
        entries
    }
}

impl BarStore for CachingStore {
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let path = self.daily_path(symbol, start, end);
        if path.exists() {
            match load_daily_parquet(&path) {
                Ok(bars) => return Ok(bars),
                Err(e) => Self::quarantine(&path, &e),
            }
        }

        let bars = self.inner.fetch_daily_bars(symbol, start, end)?;
        let df = daily_to_dataframe(&bars)?;
        let hash_input = serde_json::to_vec(&bars)
            .map_err(|e| DataError::Cache(format!("hash serialization: {e}")))?;
        let key = format!("daily_{start}_{end}");
        self.write_entry(symbol, &key, &path, &df, bars.len(), &hash_input)?;
        Ok(bars)
    }

    fn fetch_intraday_bars(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: BarInterval,
    ) -> Result<Vec<IntradayBar>, DataError> {
        let path = self.intraday_path(symbol, date, interval);
        if path.exists() {
            match load_intraday_parquet(&path) {
                Ok(bars) => return Ok(bars),
                Err(e) => Self::quarantine(&path, &e),
            }
        }

        let bars = self.inner.fetch_intraday_bars(symbol, date, interval)?;
        let df = intraday_to_dataframe(&bars)?;
        let hash_input = serde_json::to_vec(&bars)
            .map_err(|e| DataError::Cache(format!("hash serialization: {e}")))?;
        let key = format!("intraday_{date}_{}", interval.as_str());
        self.write_entry(symbol, &key, &path, &df, bars.len(), &hash_input)?;
        Ok(bars)
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

const DAILY_COLS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];
const INTRADAY_COLS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

fn daily_to_dataframe(bars: &[Bar]) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch");
    let dates: Vec<i32> = bars.iter().map(|b| (b.date - epoch).num_days() as i32).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Cache(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::Cache(format!("dataframe creation: {e}")))
}

fn intraday_to_dataframe(bars: &[IntradayBar]) -> Result<DataFrame, DataError> {
    let timestamps: Vec<i64> = bars.iter().map(|b| b.timestamp.and_utc().timestamp()).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("timestamp".into(), timestamps),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::Cache(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file = fs::File::create(path).map_err(|e| DataError::Io(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::Cache(format!("write parquet: {e}")))?;
    Ok(())
}

fn read_validated(path: &Path, expected_cols: &[&str]) -> Result<DataFrame, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::Io(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::Corrupt(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::Corrupt("empty parquet file".into()));
    }
    for col_name in expected_cols {
        if df.column(col_name).is_err() {
            return Err(DataError::Corrupt(format!("missing column '{col_name}'")));
        }
    }
    Ok(df)
}

fn f64_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Float64Chunked, DataError> {
    df.column(name)
        .map_err(|e| DataError::Corrupt(format!("column read: {e}")))?
        .f64()
        .map_err(|e| DataError::Corrupt(format!("{name} column type: {e}")))
}

fn load_daily_parquet(path: &Path) -> Result<Vec<Bar>, DataError> {
    let df = read_validated(path, &DAILY_COLS)?;

    let date_ca = df
        .column("date")
        .map_err(|e| DataError::Corrupt(format!("column read: {e}")))?
        .date()
        .map_err(|e| DataError::Corrupt(format!("date column type: {e}")))?;
    let open_ca = f64_column(&df, "open")?;
    let high_ca = f64_column(&df, "high")?;
    let low_ca = f64_column(&df, "low")?;
    let close_ca = f64_column(&df, "close")?;
    let vol_ca = df
        .column("volume")
        .map_err(|e| DataError::Corrupt(format!("column read: {e}")))?
        .u64()
        .map_err(|e| DataError::Corrupt(format!("volume column type: {e}")))?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch");
    let n = df.height();
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let date_days = date_ca
            .get(i)
            .ok_or_else(|| DataError::Corrupt(format!("null date at row {i}")))?;
        bars.push(Bar {
            date: epoch + chrono::Duration::days(i64::from(date_days)),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
        });
    }
    Ok(bars)
}

fn load_intraday_parquet(path: &Path) -> Result<Vec<IntradayBar>, DataError> {
    let df = read_validated(path, &INTRADAY_COLS)?;

    let ts_ca = df
        .column("timestamp")
        .map_err(|e| DataError::Corrupt(format!("column read: {e}")))?
        .i64()
        .map_err(|e| DataError::Corrupt(format!("timestamp column type: {e}")))?;
    let open_ca = f64_column(&df, "open")?;
    let high_ca = f64_column(&df, "high")?;
    let low_ca = f64_column(&df, "low")?;
    let close_ca = f64_column(&df, "close")?;
    let vol_ca = df
        .column("volume")
        .map_err(|e| DataError::Corrupt(format!("column read: {e}")))?
        .u64()
        .map_err(|e| DataError::Corrupt(format!("volume column type: {e}")))?;

    let n = df.height();
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let ts = ts_ca
            .get(i)
            .ok_or_else(|| DataError::Corrupt(format!("null timestamp at row {i}")))?;
        let timestamp: NaiveDateTime = chrono::DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| DataError::Corrupt(format!("invalid timestamp {ts} at row {i}")))?
            .naive_utc();
        bars.push(IntradayBar {
            timestamp,
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
        });
    }
    Ok(bars)
}
