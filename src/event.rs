//! Event constructor
//!
//! Packages a classified candidate candle into an immutable [`Event`].

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::detectors::Classification;
use crate::{round_dp, AnalysisError, Direction, OHLCVExt, Pattern, Result, OHLCV};

/// Identity of an event: the index of its source candle, shown as `evt-{index}`.
///
/// Stable within one run only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(usize);

impl EventId {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index of the source candle in the scanned series
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt-{}", self.0)
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// A classified candle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    /// RFC 3339 UTC, millisecond precision
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// `(close - open) / open * 100`, rounded to 4 places
    pub move_percent: f64,
    /// Realized direction
    pub direction: Direction,
    pub pattern: Pattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl Event {
    /// Build the event for the candle at `index`.
    ///
    /// Fails only when the candle's timestamp is not a representable instant.
    pub fn from_bar<T: OHLCV>(index: usize, bar: &T, classification: Classification) -> Result<Self> {
        let millis = bar.timestamp();
        let timestamp = normalize_timestamp(millis).ok_or(AnalysisError::InvalidTimestamp {
            index,
            value: millis,
        })?;

        Ok(Self {
            id: EventId::new(index),
            timestamp,
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            move_percent: round_dp(bar.move_percent(), 4),
            direction: bar.direction(),
            pattern: classification.pattern,
            expected_direction: classification.expected_direction,
            event_type: bar.event_type().map(str::to_owned),
        })
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// The pattern claimed a direction and the candle moved that way
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.expected_direction == Some(self.direction)
    }
}

/// Epoch milliseconds to `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn normalize_timestamp(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
