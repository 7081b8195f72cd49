//! Default thresholds and comparison helpers shared by the rule predicates.

// ============================================================
// DEFAULT THRESHOLDS
// ============================================================

/// Candles summarized before each candidate
pub const DEFAULT_LOOKBACK: usize = 10;
/// Strong candle: body > range * STRONG_BODY_RATIO
pub const STRONG_BODY_RATIO: f64 = 0.6;
/// Retest: range < avg_range * RETEST_RANGE_FACTOR
pub const RETEST_RANGE_FACTOR: f64 = 1.2;
/// Continuation: |move percent| > CONTINUATION_MIN_MOVE
pub const CONTINUATION_MIN_MOVE: f64 = 0.2;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// Body dominates the range. A zero-range candle is never strong.
#[inline]
pub fn is_strong(body: f64, range: f64, ratio: f64) -> bool {
    body > range * ratio
}

/// Range stays below the window's average range scaled by `factor`
#[inline]
pub fn is_contained(range: f64, avg_range: f64, factor: f64) -> bool {
    range < avg_range * factor
}

/// Range is at least the window's average range
#[inline]
pub fn is_expanded(range: f64, avg_range: f64) -> bool {
    range >= avg_range
}
