//! CSV-backed bar store for offline runs and hand-built fixtures.
//!
//! Layout: `{dir}/{SYMBOL}.csv` with a `date,open,high,low,close,volume`
//! header for daily bars, and `{dir}/{SYMBOL}/{date}_{interval}.csv` with a
//! `timestamp,open,high,low,close,volume` header for intraday sessions.

use super::store::{
    validate_daily_ordering, validate_intraday_ordering, BarInterval, BarStore, DataError,
};
use crate::domain::{Bar, IntradayBar};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct DailyRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

#[derive(Debug, Deserialize)]
struct IntradayRow {
    timestamp: NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn daily_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn intraday_path(&self, symbol: &str, date: NaiveDate, interval: BarInterval) -> PathBuf {
        self.dir
            .join(symbol)
            .join(format!("{date}_{}.csv", interval.as_str()))
    }

    fn read_daily(&self, symbol: &str, path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<DailyRow>() {
            let row = row.map_err(|e| DataError::Corrupt(format!("{symbol}: {e}")))?;
            bars.push(Bar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        validate_daily_ordering(symbol, &bars)?;
        Ok(bars)
    }
}

impl BarStore for CsvStore {
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let path = self.daily_path(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars: Vec<Bar> = self
            .read_daily(symbol, &path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(DataError::unavailable(
                symbol,
                format!("no bars in {start}..{end}"),
            ));
        }
        Ok(bars)
    }

    fn fetch_intraday_bars(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: BarInterval,
    ) -> Result<Vec<IntradayBar>, DataError> {
        let path = self.intraday_path(symbol, date, interval);
        if !path.exists() {
            return Err(DataError::unavailable(
                symbol,
                format!("no {} session file for {date}", interval.as_str()),
            ));
        }
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<IntradayRow>() {
            let row = row.map_err(|e| DataError::Corrupt(format!("{symbol}: {e}")))?;
            bars.push(IntradayBar {
                timestamp: row.timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        validate_intraday_ordering(symbol, &bars)?;
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("swinglab_csv_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_daily_fixture() {
        let dir = temp_dir();
        fs::write(
            dir.join("SPY.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-02,100.0,102.0,99.0,101.0,1000\n\
             2024-01-03,101.0,103.0,100.0,102.0,1100\n",
        )
        .unwrap();

        let store = CsvStore::new(&dir);
        let bars = store
            .fetch_daily_bars(
                "SPY",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 102.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_symbol_reports_not_found() {
        let dir = temp_dir();
        let store = CsvStore::new(&dir);
        let err = store
            .fetch_daily_bars(
                "QQQ",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_rows_are_corrupt() {
        let dir = temp_dir();
        fs::write(
            dir.join("BAD.csv"),
            "date,open,high,low,close,volume\nnot-a-date,1,2,3,4,5\n",
        )
        .unwrap();
        let store = CsvStore::new(&dir);
        let err = store
            .fetch_daily_bars(
                "BAD",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DataError::Corrupt(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn reads_intraday_session() {
        let dir = temp_dir();
        fs::create_dir_all(dir.join("SPY")).unwrap();
        fs::write(
            dir.join("SPY").join("2024-01-03_5m.csv"),
            "timestamp,open,high,low,close,volume\n\
             2024-01-03T09:30:00,100.0,100.5,99.8,100.2,500\n\
             2024-01-03T09:35:00,100.2,100.9,100.1,100.7,450\n",
        )
        .unwrap();

        let store = CsvStore::new(&dir);
        let bars = store
            .fetch_intraday_bars(
                "SPY",
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                BarInterval::FiveMinute,
            )
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 100.7);
        let _ = fs::remove_dir_all(&dir);
    }
}
