//! Small indicator helpers shared by scanners and exit policies.
//!
//! All functions operate on a trailing window ending at the last element of
//! `bars` and return `None` when the window is not yet full, so callers never
//! act on a partially warmed value.

use crate::domain::Bar;

/// Simple moving average of closes over the last `period` bars.
pub fn sma(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let window = &bars[bars.len() - period..];
    Some(window.iter().map(|b| b.close).sum::<f64>() / period as f64)
}

/// Highest high over the last `period` bars.
pub fn highest_high(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    bars[bars.len() - period..]
        .iter()
        .map(|b| b.high)
        .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h))))
}

/// Lowest low over the last `period` bars.
pub fn lowest_low(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    bars[bars.len() - period..]
        .iter()
        .map(|b| b.low)
        .fold(None, |acc: Option<f64>, l| Some(acc.map_or(l, |a| a.min(l))))
}

/// Average true range over the last `period` bars (Wilder's TR, simple mean).
/// Needs `period + 1` bars for the first true range's previous close.
pub fn atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }
    let start = bars.len() - period;
    let mut sum = 0.0;
    for i in start..bars.len() {
        let prev_close = bars[i - 1].close;
        let tr = (bars[i].high - bars[i].low)
            .max((bars[i].high - prev_close).abs())
            .max((bars[i].low - prev_close).abs());
        sum += tr;
    }
    Some(sum / period as f64)
}
