//! Yahoo Finance bar store.
//!
//! Fetches daily and intraday OHLCV bars from Yahoo's v8 chart API with bounded
//! retries and exponential backoff. Yahoo has no official API and is subject to
//! unannounced format changes; the CSV store is the offline fallback.

use super::store::{validate_daily_ordering, BarInterval, BarStore, DataError};
use crate::domain::{Bar, IntradayBar};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// One parsed row, shared by the daily and intraday paths.
#[derive(Debug)]
struct ParsedRow {
    ts: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

pub struct YahooStore {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl Default for YahooStore {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooStore {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate, interval: &str) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).expect("midnight").and_utc().timestamp();
        let end_ts = end.and_hms_opt(23, 59, 59).expect("day end").and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval={interval}"
        )
    }

    /// Parse the chart API response into per-timestamp rows.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<ParsedRow>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::Format(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::Format("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::Format("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::Format("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::Format("no quote data".into()))?;

        let mut rows = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Rows where everything is None are holidays/halts; skip them so
            // downstream series stay gap-free.
            let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
                continue;
            };
            rows.push(ParsedRow {
                ts,
                open,
                high,
                low,
                close,
                volume: volume.unwrap_or(0),
            });
        }

        if rows.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(rows)
    }

    /// Execute one chart request with retry/backoff.
    fn fetch_rows(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<ParsedRow>, DataError> {
        let url = Self::chart_url(symbol, start, end, interval);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::Network(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::Format(format!("failed to parse response for {symbol}: {e}"))
                    })?;
                    return Self::parse_response(symbol, chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::Network(e.to_string()));
                        continue;
                    }
                    return Err(DataError::Network(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Network("max retries exceeded".into())))
    }
}

impl BarStore for YahooStore {
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let rows = self.fetch_rows(symbol, start, end, "1d")?;
        let bars: Vec<Bar> = rows
            .into_iter()
            .filter_map(|r| {
                let date = chrono::DateTime::from_timestamp(r.ts, 0)?.naive_utc().date();
                Some(Bar {
                    date,
                    open: r.open,
                    high: r.high,
                    low: r.low,
                    close: r.close,
                    volume: r.volume,
                })
            })
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        validate_daily_ordering(symbol, &bars)?;
        if bars.is_empty() {
            return Err(DataError::unavailable(symbol, format!("no bars in {start}..{end}")));
        }
        Ok(bars)
    }

    fn fetch_intraday_bars(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: BarInterval,
    ) -> Result<Vec<IntradayBar>, DataError> {
        let rows = self.fetch_rows(symbol, date, date, interval.as_str())?;
        let bars: Vec<IntradayBar> = rows
            .into_iter()
            .filter_map(|r| {
                let timestamp = chrono::DateTime::from_timestamp(r.ts, 0)?.naive_utc();
                Some(IntradayBar {
                    timestamp,
                    open: r.open,
                    high: r.high,
                    low: r.low,
                    close: r.close,
                    volume: r.volume,
                })
            })
            .collect();
        if bars.is_empty() {
            return Err(DataError::unavailable(symbol, format!("no session bars for {date}")));
        }
        Ok(bars)
    }
}
