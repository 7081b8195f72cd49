//! # candle-events
//!
//! Turns a candle series into labeled market events and measures how often
//! each detected pattern coincided with the direction it is expected to produce.
//!
//! ## Quick Start
//!
//! ```rust
//! use candle_events::prelude::*;
//!
//! // Any type implementing OHLCV works; `Candle` is the bundled record.
//! let bars: Vec<Candle> = (0..20)
//!     .map(|i| Candle::new(i * 60_000, 100.0, 101.0, 99.0, 100.5, 1_000.0))
//!     .collect();
//!
//! let engine = EngineBuilder::new().build().unwrap();
//!
//! // Classify, then aggregate with no filter
//! let report = engine.analyze(&bars, &EventFilter::new()).unwrap();
//! assert_eq!(report.count, 10);
//! ```

pub mod detectors;
pub mod event;
pub mod filter;
pub mod params;
pub mod stats;
pub mod window;

pub mod prelude {
    pub use crate::{
        // Classifier
        detectors::{classify, Candidate, Classification, Rule, CASCADE},
        // Events
        event::{Event, EventId},
        // Filtering
        filter::EventFilter,
        // Parameters
        params::{ClassifierConfig, ParamMeta, ParamType},
        // Parallel
        scan_parallel,
        // Aggregation
        stats::{aggregate, AnalysisReport, PatternReliability, PatternStats},
        // Window
        window::WindowContext,
        // Errors
        AnalysisError,
        // Types
        Candle,
        Direction,
        // Engine
        EngineBuilder,
        EventEngine,
        EventIterator,
        Factor,
        // Core traits
        OHLCVExt,
        Pattern,
        Period,
        Ratio,
        Result,
        ScanError,
        ScanResult,
        OHLCV,
    };
}

use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace, warn};

use crate::detectors::classify;
use crate::event::Event;
use crate::filter::EventFilter;
use crate::params::ClassifierConfig;
use crate::stats::{aggregate, AnalysisReport};
use crate::window::WindowContext;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while building an engine or classifying a series
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },

    #[error("Timestamp at index {index} ({current}) does not follow previous timestamp ({previous})")]
    NonMonotonicTimestamp {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("Timestamp at index {index} is not a representable instant: {value}")]
    InvalidTimestamp { index: usize, value: i64 },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

/// Non-negative finite multiplier, e.g. a range factor or a percent threshold
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Factor(f64);

impl Factor {
    /// Create a new Factor, validating the value is finite and >= 0.0
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue(
                "Factor cannot be NaN or infinite",
            ));
        }
        if value < 0.0 {
            return Err(AnalysisError::OutOfRange {
                field: "Factor",
                value,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

/// Serialize as the bare inner value; deserialize through the validating constructor.
macro_rules! impl_validated_serde {
    ($($ty:ident => $inner:ty),* $(,)?) => {
        $(
            impl serde::Serialize for $ty {
                fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                    serde::Serialize::serialize(&self.0, s)
                }
            }

            impl<'de> serde::Deserialize<'de> for $ty {
                fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
                    let value = <$inner as serde::Deserialize>::deserialize(d)?;
                    $ty::new(value).map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

impl_validated_serde!(Ratio => f64, Period => usize, Factor => f64);

// ============================================================
// NUMERIC HELPERS
// ============================================================

/// Round to `decimals` places, half away from zero. Never returns `-0.0`.
#[inline]
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale + 0.0
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
///
/// Implementors must hold `low <= min(open, close) <= max(open, close) <= high`
/// and ascending timestamps across a series. [`EventEngine`] checks both when
/// data validation is enabled.
pub trait OHLCV {
    /// Epoch milliseconds
    fn timestamp(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// Opaque category tag attached upstream (e.g. `"earnings"`), copied onto events
    fn event_type(&self) -> Option<&str> {
        None
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    /// Percentage change from open to close
    #[inline]
    fn move_percent(&self) -> f64 {
        (self.close() - self.open()) / self.open() * 100.0
    }

    /// Realized direction; a flat candle counts as up
    #[inline]
    fn direction(&self) -> Direction {
        Direction::of_move(self.open(), self.close())
    }

    /// Body as ratio of range. Returns None if range ≈ 0
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(AnalysisError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(AnalysisError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if prices.iter().any(|p| *p <= 0.0) {
            return Err(AnalysisError::InvalidOHLCV {
                index: 0,
                reason: "non-positive price",
            });
        }
        if self.high() < self.low() {
            return Err(AnalysisError::InvalidOHLCV {
                index: 0,
                reason: "high < low",
            });
        }
        if self.low() > self.open().min(self.close()) {
            return Err(AnalysisError::InvalidOHLCV {
                index: 0,
                reason: "low above body",
            });
        }
        if self.high() < self.open().max(self.close()) {
            return Err(AnalysisError::InvalidOHLCV {
                index: 0,
                reason: "high below body",
            });
        }
        if !self.volume().is_finite() || self.volume() < 0.0 {
            return Err(AnalysisError::InvalidOHLCV {
                index: 0,
                reason: "volume must be finite and non-negative",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// One OHLCV sample for a fixed interval, as handed over by a market-data source
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(
        default,
        rename = "eventType",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type: Option<String>,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            event_type: None,
        }
    }

    /// Attach an opaque category tag
    pub fn with_event_type(mut self, tag: impl Into<String>) -> Self {
        self.event_type = Some(tag.into());
        self
    }
}

impl OHLCV for Candle {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }
}

// ============================================================
// DIRECTION & PATTERN
// ============================================================

/// Direction of a candle move, realized or expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `Up` when `close >= open`, else `Down`
    #[inline]
    pub fn of_move(open: f64, close: f64) -> Self {
        if close >= open {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label assigned to a candidate candle by the rule cascade.
///
/// Variants are declared in cascade order, which is also the key order of
/// every per-pattern map in an [`AnalysisReport`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Breakout,
    Fakeout,
    Retest,
    /// Strong breakdown below the window low, used as a reversal proxy
    HeadAndShoulders,
    Continuation,
    /// No rule matched
    #[default]
    RawCandle,
}

impl Pattern {
    pub const ALL: [Pattern; 6] = [
        Pattern::Breakout,
        Pattern::Fakeout,
        Pattern::Retest,
        Pattern::HeadAndShoulders,
        Pattern::Continuation,
        Pattern::RawCandle,
    ];

    /// Returns the string label
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Pattern::Breakout => "breakout",
            Pattern::Fakeout => "fakeout",
            Pattern::Retest => "retest",
            Pattern::HeadAndShoulders => "head_and_shoulders",
            Pattern::Continuation => "continuation",
            Pattern::RawCandle => "raw_candle",
        }
    }

    /// Direction the pattern claims, or `None` when it makes no directional claim.
    pub fn expected_direction(self) -> Option<Direction> {
        match self {
            Pattern::Breakout | Pattern::Fakeout | Pattern::Retest | Pattern::Continuation => {
                Some(Direction::Up)
            }
            Pattern::HeadAndShoulders => Some(Direction::Down),
            Pattern::RawCandle => None,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Pattern::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(AnalysisError::InvalidValue("unknown pattern label"))
    }
}

// ============================================================
// EVENT ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reject malformed series before classification
    pub validate_data: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_data: true,
        }
    }
}

/// Classifies candle series into events and aggregates them.
///
/// Holds no state between calls; one engine can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct EventEngine {
    classifier: ClassifierConfig,
    config: EngineConfig,
}

impl EventEngine {
    pub fn new(classifier: ClassifierConfig) -> Result<Self> {
        EngineBuilder::new().config(classifier).build()
    }

    #[inline]
    pub fn classifier_config(&self) -> &ClassifierConfig {
        &self.classifier
    }

    #[inline]
    pub fn lookback(&self) -> usize {
        self.classifier.lookback.get()
    }

    // ===========================================
    // LOW-LEVEL: Window context
    // ===========================================

    /// Window context for candidate `index`; `None` without a full trailing window.
    #[inline]
    pub fn window_at<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<WindowContext> {
        window::build_window(bars, index, self.classifier.lookback)
    }

    /// Window contexts for every candidate index, in order.
    pub fn compute_windows<T: OHLCV>(&self, bars: &[T]) -> Vec<WindowContext> {
        window::candidate_indices(bars.len(), self.classifier.lookback)
            .filter_map(|i| self.window_at(bars, i))
            .collect()
    }

    // ===========================================
    // MID-LEVEL: Single candidate
    // ===========================================

    /// Classify the candle at `index`. `Ok(None)` when `index` is not a candidate.
    ///
    /// Does not validate the series.
    pub fn scan_at<T: OHLCV>(&self, bars: &[T], index: usize) -> Result<Option<Event>> {
        let Some(ctx) = self.window_at(bars, index) else {
            return Ok(None);
        };
        let Some(bar) = bars.get(index) else {
            return Ok(None);
        };
        let classification = classify(bar, &ctx, &self.classifier);
        trace!(index, pattern = %classification.pattern, "classified candle");
        Event::from_bar(index, bar, classification).map(Some)
    }

    // ===========================================
    // HIGH-LEVEL: Batch processing
    // ===========================================

    /// Classify every candidate candle. Yields `max(0, len - lookback)` events.
    pub fn scan<T: OHLCV>(&self, bars: &[T]) -> Result<Vec<Event>> {
        if self.config.validate_data {
            self.validate_bars(bars)?;
        }

        let events = self.iter(bars).collect::<Result<Vec<_>>>()?;
        debug!(
            bars = bars.len(),
            events = events.len(),
            lookback = self.lookback(),
            "classified candle series"
        );
        Ok(events)
    }

    /// Same output as [`scan`](Self::scan), classifying candidates in parallel.
    pub fn scan_par<T: OHLCV + Sync>(&self, bars: &[T]) -> Result<Vec<Event>> {
        if self.config.validate_data {
            self.validate_bars(bars)?;
        }

        let events = window::candidate_indices(bars.len(), self.classifier.lookback)
            .into_par_iter()
            .filter_map(|i| self.scan_at(bars, i).transpose())
            .collect::<Result<Vec<_>>>()?;
        debug!(
            bars = bars.len(),
            events = events.len(),
            lookback = self.lookback(),
            "classified candle series in parallel"
        );
        Ok(events)
    }

    /// Classify, filter and aggregate in one call.
    pub fn analyze<T: OHLCV>(&self, bars: &[T], filter: &EventFilter) -> Result<AnalysisReport> {
        let events = self.scan(bars)?;
        Ok(aggregate(filter.apply(&events)))
    }

    /// Lazily classify candidates one at a time. Does not validate the series.
    pub fn iter<'a, T: OHLCV>(&'a self, bars: &'a [T]) -> EventIterator<'a, T> {
        EventIterator::new(self, bars)
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn validate_bars<T: OHLCV>(&self, bars: &[T]) -> Result<()> {
        check_bars(bars).inspect_err(|e| warn!(error = %e, "rejecting candle series"))
    }
}

fn check_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    let mut previous: Option<i64> = None;
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            AnalysisError::InvalidOHLCV { reason, .. } => {
                AnalysisError::InvalidOHLCV { index: i, reason }
            }
            other => other,
        })?;

        let current = bar.timestamp();
        if let Some(previous) = previous {
            if current <= previous {
                return Err(AnalysisError::NonMonotonicTimestamp {
                    index: i,
                    previous,
                    current,
                });
            }
        }
        previous = Some(current);
    }
    Ok(())
}

// ============================================================
// EVENT ITERATOR
// ============================================================

/// Iterator over candidate candles, yielding one event each
pub struct EventIterator<'a, T: OHLCV> {
    engine: &'a EventEngine,
    bars: &'a [T],
    current: usize,
}

impl<'a, T: OHLCV> EventIterator<'a, T> {
    fn new(engine: &'a EventEngine, bars: &'a [T]) -> Self {
        Self {
            engine,
            bars,
            current: window::candidate_indices(bars.len(), engine.classifier.lookback).start,
        }
    }
}

impl<'a, T: OHLCV> Iterator for EventIterator<'a, T> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.bars.len() {
            return None;
        }

        let index = self.current;
        self.current += 1;

        self.engine.scan_at(self.bars, index).transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bars.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl<'a, T: OHLCV> ExactSizeIterator for EventIterator<'a, T> {}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating EventEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    classifier: ClassifierConfig,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole classifier configuration
    pub fn config(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Number of preceding candles summarized for each candidate
    pub fn lookback(mut self, lookback: Period) -> Self {
        self.classifier.lookback = lookback;
        self
    }

    /// Share of the range a body must exceed to count as strong
    pub fn strong_body_ratio(mut self, ratio: Ratio) -> Self {
        self.classifier.strong_body_ratio = ratio;
        self
    }

    /// Retest range must stay under `avg_range * factor`
    pub fn retest_range_factor(mut self, factor: Factor) -> Self {
        self.classifier.retest_range_factor = factor;
        self
    }

    /// Minimum absolute move, in percent, for a continuation
    pub fn continuation_min_move(mut self, percent: Factor) -> Self {
        self.classifier.continuation_min_move = percent;
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<EventEngine> {
        self.classifier.validate()?;
        Ok(EventEngine {
            classifier: self.classifier,
            config: self.config,
        })
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub events: Vec<Event>,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: AnalysisError,
}

/// Parallel scanning of multiple instruments
pub fn scan_parallel<'a, T, I>(engine: &EventEngine, instruments: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .scan(bars)
                .map(|events| ScanResult {
                    symbol: symbol.to_string(),
                    events,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
