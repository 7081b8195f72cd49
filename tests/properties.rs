//! Property tests over arbitrary well-formed candle series.

use candle_events::prelude::*;
use proptest::prelude::*;

/// (open, signed body, upper wick, lower wick) per candle
fn candle_specs(max_len: usize) -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(
        (50.0f64..150.0, -8.0f64..8.0, 0.0f64..4.0, 0.0f64..4.0),
        0..max_len,
    )
}

fn build_series(specs: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    specs
        .iter()
        .enumerate()
        .map(|(i, &(open, body, up, down))| {
            let close = open + body;
            Candle::new(
                i as i64 * 60_000,
                open,
                open.max(close) + up,
                open.min(close) - down,
                close,
                1000.0,
            )
        })
        .collect()
}

fn engine(lookback: usize) -> EventEngine {
    EngineBuilder::new()
        .lookback(Period::new(lookback).unwrap())
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn event_count_is_len_minus_lookback(specs in candle_specs(60), lookback in 1usize..15) {
        let bars = build_series(&specs);
        let events = engine(lookback).scan(&bars).unwrap();
        prop_assert_eq!(events.len(), bars.len().saturating_sub(lookback));
    }

    #[test]
    fn events_are_consistent_with_their_source(specs in candle_specs(60)) {
        let bars = build_series(&specs);
        let events = engine(10).scan(&bars).unwrap();

        for event in &events {
            let source = &bars[event.id.index()];
            prop_assert!(event.id.index() >= 10);
            prop_assert_eq!(event.close, source.close);
            prop_assert_eq!(event.direction == Direction::Up, event.close >= event.open);
            prop_assert_eq!(event.expected_direction, event.pattern.expected_direction());
        }
    }

    #[test]
    fn classification_is_idempotent(specs in candle_specs(60)) {
        let bars = build_series(&specs);
        let engine = engine(10);
        prop_assert_eq!(engine.scan(&bars).unwrap(), engine.scan(&bars).unwrap());
        prop_assert_eq!(engine.scan(&bars).unwrap(), engine.scan_par(&bars).unwrap());
    }

    #[test]
    fn overall_is_weighted_pattern_reliability(specs in candle_specs(80)) {
        let bars = build_series(&specs);
        let report = engine(10).analyze(&bars, &EventFilter::new()).unwrap();

        // Each side carries at most half a unit of rounding in the second place
        let diff = (report.pattern_reliability.overall - report.weighted_pattern_reliability()).abs();
        prop_assert!(diff <= 0.011, "diff {}", diff);

        let counted: usize = report.events_count_by_pattern.values().sum();
        prop_assert_eq!(counted, report.count);
        for (pattern, stats) in &report.pattern_reliability.by_pattern {
            prop_assert_eq!(report.events_count_by_pattern[pattern], stats.count);
        }
    }

    #[test]
    fn pattern_filter_narrows_to_one_key(specs in candle_specs(80), idx in 0usize..6) {
        let pattern = Pattern::ALL[idx];
        let bars = build_series(&specs);
        let report = engine(10)
            .analyze(&bars, &EventFilter::new().with_pattern(pattern))
            .unwrap();

        prop_assert!(report.pattern_reliability.by_pattern.len() <= 1);
        prop_assert!(report.pattern_reliability.by_pattern.keys().all(|p| *p == pattern));
        if report.count == 0 {
            prop_assert_eq!(report, AnalysisReport::empty());
        }
    }

    #[test]
    fn short_series_yield_zero_report(specs in candle_specs(11)) {
        let bars = build_series(&specs);
        let report = engine(10).analyze(&bars, &EventFilter::new()).unwrap();
        prop_assert_eq!(report, AnalysisReport::empty());
    }
}
