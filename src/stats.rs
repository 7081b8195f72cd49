//! Reliability aggregation
//!
//! Summary statistics over a (possibly filtered) event collection: average
//! move and range, per-pattern hit rate, and the count-weighted overall hit
//! rate. Every ratio guards its denominator, so an empty collection yields a
//! zero-valued report rather than NaN.
//!
//! An event whose pattern makes no directional claim (`raw_candle`) still
//! counts toward its pattern's total but can never be a hit, so it lowers the
//! reliability it is part of.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::event::{Event, EventId};
use crate::{round_dp, Direction, Pattern};

/// Raw hit counts for one pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternTally {
    pub count: usize,
    /// Events whose expected direction equals the realized one
    pub matches: usize,
}

impl PatternTally {
    /// `matches / count * 100`, rounded to 2 places; 0 when `count` is 0
    pub fn reliability(&self) -> f64 {
        percent(self.matches, self.count)
    }
}

/// Count and reliability of one pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternStats {
    pub count: usize,
    pub reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReliability {
    /// Total hits over total events, in percent
    pub overall: f64,
    pub by_pattern: BTreeMap<Pattern, PatternStats>,
}

/// Relative importance of each metric when a consumer blends them into one score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub avg_move: f64,
    pub avg_range: f64,
    pub pattern_reliability: f64,
    pub explanation: &'static str,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            avg_move: 0.4,
            avg_range: 0.3,
            pattern_reliability: 0.3,
            explanation: "Weights indicate relative importance when combining metrics into a composite score. Adjust as needed.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMetric {
    pub id: EventId,
    pub move_percent: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeMetric {
    pub id: EventId,
    /// `high - low`, rounded to 4 places
    pub range: f64,
}

/// Per-event inputs behind the averages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawMetrics {
    pub moves: Vec<MoveMetric>,
    pub ranges: Vec<RangeMetric>,
}

/// Analysis result handed to presentation and export consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub count: usize,
    /// Rounded to 4 places
    pub average_move_percent: f64,
    /// Rounded to 4 places
    pub average_range: f64,
    pub pattern_reliability: PatternReliability,
    /// Same counts as `pattern_reliability.by_pattern`, kept as its own field
    pub events_count_by_pattern: BTreeMap<Pattern, usize>,
    pub weights: ScoreWeights,
    pub raw_metrics: RawMetrics,
}

impl AnalysisReport {
    /// Zero-valued report, identical to aggregating no events
    pub fn empty() -> Self {
        aggregate(std::iter::empty::<&Event>())
    }

    /// Count-weighted mean of the per-pattern reliabilities
    pub fn weighted_pattern_reliability(&self) -> f64 {
        let by_pattern = &self.pattern_reliability.by_pattern;
        let total: usize = by_pattern.values().map(|s| s.count).sum();
        if total == 0 {
            return 0.0;
        }
        by_pattern
            .values()
            .map(|s| s.reliability * s.count as f64)
            .sum::<f64>()
            / total as f64
    }
}

/// Hit counts per pattern label present in `events`
pub fn tally<'a, I>(events: I) -> BTreeMap<Pattern, PatternTally>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut tallies: BTreeMap<Pattern, PatternTally> = BTreeMap::new();
    for event in events {
        let entry = tallies.entry(event.pattern).or_default();
        entry.count += 1;
        if event.is_hit() {
            entry.matches += 1;
        }
    }
    tallies
}

/// Compute the full report over `events`
pub fn aggregate<'a, I>(events: I) -> AnalysisReport
where
    I: IntoIterator<Item = &'a Event>,
{
    let events: Vec<&Event> = events.into_iter().collect();
    let count = events.len();

    let moves: Vec<f64> = events.iter().map(|e| e.move_percent).collect();
    let ranges: Vec<f64> = events.iter().map(|e| e.range()).collect();

    let tallies = tally(events.iter().copied());
    let total_matches: usize = tallies.values().map(|t| t.matches).sum();

    let by_pattern = tallies
        .iter()
        .map(|(pattern, t)| {
            (
                *pattern,
                PatternStats {
                    count: t.count,
                    reliability: t.reliability(),
                },
            )
        })
        .collect();

    let events_count_by_pattern = tallies.iter().map(|(pattern, t)| (*pattern, t.count)).collect();

    let overall = percent(total_matches, count);
    debug!(count, overall, "aggregated pattern reliability");

    AnalysisReport {
        count,
        average_move_percent: round_dp(mean(&moves), 4),
        average_range: round_dp(mean(&ranges), 4),
        pattern_reliability: PatternReliability {
            overall,
            by_pattern,
        },
        events_count_by_pattern,
        weights: ScoreWeights::default(),
        raw_metrics: RawMetrics {
            moves: events
                .iter()
                .map(|e| MoveMetric {
                    id: e.id,
                    move_percent: e.move_percent,
                    direction: e.direction,
                })
                .collect(),
            ranges: events
                .iter()
                .zip(&ranges)
                .map(|(e, range)| RangeMetric {
                    id: e.id,
                    range: round_dp(*range, 4),
                })
                .collect(),
        },
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_dp(part as f64 / whole as f64 * 100.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::Classification;
    use crate::Candle;

    fn event(index: usize, pattern: Pattern, o: f64, c: f64) -> Event {
        let bar = Candle::new(index as i64, o, o.max(c) + 1.0, o.min(c) - 1.0, c, 0.0);
        let classification = Classification {
            pattern,
            expected_direction: pattern.expected_direction(),
        };
        Event::from_bar(index, &bar, classification).unwrap()
    }

    #[test]
    fn test_hit_and_miss_give_fifty_percent() {
        let events = vec![
            event(10, Pattern::Breakout, 100.0, 110.0),
            event(11, Pattern::Breakout, 100.0, 95.0),
        ];
        let report = aggregate(&events);

        assert_eq!(report.count, 2);
        assert_eq!(
            report.pattern_reliability.by_pattern[&Pattern::Breakout],
            PatternStats {
                count: 2,
                reliability: 50.0
            }
        );
        assert_eq!(report.pattern_reliability.overall, 50.0);
        assert_eq!(report.events_count_by_pattern[&Pattern::Breakout], 2);
    }

    #[test]
    fn test_averages() {
        let events = vec![
            event(10, Pattern::Breakout, 100.0, 110.0),
            event(11, Pattern::Retest, 100.0, 95.0),
        ];
        let report = aggregate(&events);

        // moves 10 and -5; ranges 12 and 7
        assert_eq!(report.average_move_percent, 2.5);
        assert_eq!(report.average_range, 9.5);
        assert_eq!(report.raw_metrics.moves.len(), 2);
        assert_eq!(report.raw_metrics.ranges[1].range, 7.0);
        assert_eq!(report.raw_metrics.moves[1].direction, Direction::Down);
    }

    #[test]
    fn test_raw_candle_counts_but_never_hits() {
        let events = vec![
            event(10, Pattern::RawCandle, 100.0, 101.0),
            event(11, Pattern::Continuation, 100.0, 101.0),
        ];
        let report = aggregate(&events);
        let by_pattern = &report.pattern_reliability.by_pattern;

        assert_eq!(by_pattern[&Pattern::RawCandle].count, 1);
        assert_eq!(by_pattern[&Pattern::RawCandle].reliability, 0.0);
        assert_eq!(by_pattern[&Pattern::Continuation].reliability, 100.0);
        assert_eq!(report.pattern_reliability.overall, 50.0);
    }

    #[test]
    fn test_reliability_rounded_to_two_places() {
        let events = vec![
            event(10, Pattern::Retest, 100.0, 101.0),
            event(11, Pattern::Retest, 100.0, 101.0),
            event(12, Pattern::Retest, 100.0, 99.0),
        ];
        let report = aggregate(&events);
        assert_eq!(
            report.pattern_reliability.by_pattern[&Pattern::Retest].reliability,
            66.67
        );
    }

    #[test]
    fn test_empty_collection_is_zero_report() {
        let report = aggregate(&Vec::<Event>::new());

        assert_eq!(report.count, 0);
        assert_eq!(report.average_move_percent, 0.0);
        assert_eq!(report.average_range, 0.0);
        assert_eq!(report.pattern_reliability.overall, 0.0);
        assert!(report.pattern_reliability.by_pattern.is_empty());
        assert!(report.events_count_by_pattern.is_empty());
        assert_eq!(report, AnalysisReport::empty());
    }

    #[test]
    fn test_tally_guards_zero_count() {
        assert_eq!(PatternTally::default().reliability(), 0.0);
    }

    #[test]
    fn test_by_pattern_follows_cascade_order() {
        let events = vec![
            event(10, Pattern::RawCandle, 100.0, 101.0),
            event(11, Pattern::HeadAndShoulders, 100.0, 90.0),
            event(12, Pattern::Breakout, 100.0, 110.0),
        ];
        let report = aggregate(&events);
        let keys: Vec<_> = report.pattern_reliability.by_pattern.keys().copied().collect();
        assert_eq!(
            keys,
            [Pattern::Breakout, Pattern::HeadAndShoulders, Pattern::RawCandle]
        );
    }

    #[test]
    fn test_overall_equals_weighted_pattern_reliability() {
        let events = vec![
            event(10, Pattern::Breakout, 100.0, 110.0),
            event(11, Pattern::Breakout, 100.0, 95.0),
            event(12, Pattern::HeadAndShoulders, 100.0, 90.0),
            event(13, Pattern::RawCandle, 100.0, 101.0),
        ];
        let report = aggregate(&events);
        assert_eq!(report.pattern_reliability.overall, 50.0);
        assert!((report.weighted_pattern_reliability() - 50.0).abs() < 1e-9);
    }
}
