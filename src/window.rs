//! Trailing window context
//!
//! For candidate index `i` the context summarizes exactly the `lookback` candles
//! in `bars[i - lookback..i]`, excluding the candidate itself. It is recomputed
//! from the immutable series for every candidate rather than carried as rolling
//! state, so candidates can be classified independently and in any order.

use std::ops::Range;

use crate::{OHLCVExt, Period, OHLCV};

/// Summary of the candles immediately preceding a candidate
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowContext {
    pub highest_high: f64,
    pub lowest_low: f64,
    /// `(highest_high + lowest_low) / 2`
    pub midpoint: f64,
    /// Mean of `high - low` over the window
    pub avg_range: f64,
}

impl WindowContext {
    /// Summarize a slice of candles. `None` for an empty slice.
    pub fn from_bars<T: OHLCV>(window: &[T]) -> Option<Self> {
        if window.is_empty() {
            return None;
        }

        let (highest_high, lowest_low, sum_range) = window.iter().fold(
            (f64::NEG_INFINITY, f64::INFINITY, 0.0),
            |(hi, lo, sum), bar| (hi.max(bar.high()), lo.min(bar.low()), sum + OHLCVExt::range(bar)),
        );

        Some(Self {
            highest_high,
            lowest_low,
            midpoint: (highest_high + lowest_low) / 2.0,
            avg_range: sum_range / window.len() as f64,
        })
    }
}

/// Context for candidate `index`; `None` when `index < lookback` or out of bounds.
pub fn build_window<T: OHLCV>(bars: &[T], index: usize, lookback: Period) -> Option<WindowContext> {
    let n = lookback.get();
    if index < n || index >= bars.len() {
        return None;
    }
    WindowContext::from_bars(&bars[index - n..index])
}

/// Indices with a full trailing window; empty when `len <= lookback`.
#[inline]
pub fn candidate_indices(len: usize, lookback: Period) -> Range<usize> {
    lookback.get().min(len)..len
}
