//! Per-symbol series cache for the day loop.
//!
//! Each symbol's daily series is fetched once (lazily, on first touch) for the
//! whole run range plus warmup, then served as slices. The engine's only data
//! dependency during the loop is this cache, which keeps BarStore latency out
//! of the inner day iteration.

use crate::data::{BarStore, DataError};
use crate::domain::Bar;
use chrono::NaiveDate;
use std::collections::HashMap;

pub struct SeriesCache<'a> {
    store: &'a dyn BarStore,
    fetch_start: NaiveDate,
    fetch_end: NaiveDate,
    /// Loaded series per symbol. A `None` marks a symbol whose fetch failed,
    /// so we don't hammer the store every day for it.
    series: HashMap<String, Option<Vec<Bar>>>,
}

impl<'a> SeriesCache<'a> {
    pub fn new(store: &'a dyn BarStore, fetch_start: NaiveDate, fetch_end: NaiveDate) -> Self {
        Self {
            store,
            fetch_start,
            fetch_end,
            series: HashMap::new(),
        }
    }

    fn ensure_loaded(&mut self, symbol: &str) {
        if !self.series.contains_key(symbol) {
            let fetched = self
                .store
                .fetch_daily_bars(symbol, self.fetch_start, self.fetch_end)
                .ok();
            self.series.insert(symbol.to_string(), fetched);
        }
    }

    /// The symbol's bars up to and including `date`. Empty slice when the
    /// symbol has no data at or before `date`.
    pub fn bars_up_to(&mut self, symbol: &str, date: NaiveDate) -> Result<&[Bar], DataError> {
        self.ensure_loaded(symbol);
        match self.series.get(symbol).expect("just loaded") {
            Some(bars) => {
                let idx = bars.partition_point(|b| b.date <= date);
                Ok(&bars[..idx])
            }
            None => Err(DataError::unavailable(symbol, "series fetch failed")),
        }
    }

    /// The bar for exactly `date`, if the symbol traded that day.
    pub fn bar_on(&mut self, symbol: &str, date: NaiveDate) -> Option<Bar> {
        self.ensure_loaded(symbol);
        self.series
            .get(symbol)
            .and_then(|s| s.as_ref())
            .and_then(|bars| {
                let idx = bars.partition_point(|b| b.date < date);
                bars.get(idx).filter(|b| b.date == date).cloned()
            })
    }
}
