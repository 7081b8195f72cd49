//! Event filter
//!
//! Optional equality filters on pattern label and event category. Both are
//! independent; supplied together they combine with AND. A filter that matches
//! nothing yields an empty selection, never an error.

use serde::Deserialize;
use tracing::debug;

use crate::event::Event;
use crate::Pattern;

/// Request-time narrowing of an event collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventFilter {
    /// Exact match on the pattern label, e.g. `"breakout"`
    pub pattern: Option<String>,
    /// Exact match on the category tag; events without one never match
    pub event_type: Option<String>,
}

impl EventFilter {
    /// Filter that passes every event
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(mut self, label: impl Into<String>) -> Self {
        self.pattern = Some(label.into());
        self
    }

    pub fn with_pattern(self, pattern: Pattern) -> Self {
        self.pattern(pattern.as_str())
    }

    pub fn event_type(mut self, tag: impl Into<String>) -> Self {
        self.event_type = Some(tag.into());
        self
    }

    /// No criteria set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.event_type.is_none()
    }

    pub fn matches(&self, event: &Event) -> bool {
        let pattern_ok = self
            .pattern
            .as_deref()
            .map_or(true, |p| event.pattern.as_str() == p);
        let type_ok = self
            .event_type
            .as_deref()
            .map_or(true, |t| event.event_type.as_deref() == Some(t));
        pattern_ok && type_ok
    }

    /// Events passing the filter, in their original order
    pub fn apply<'a>(&self, events: &'a [Event]) -> Vec<&'a Event> {
        let selected: Vec<&Event> = events.iter().filter(|e| self.matches(e)).collect();
        if !self.is_empty() {
            debug!(
                pattern = self.pattern.as_deref(),
                event_type = self.event_type.as_deref(),
                before = events.len(),
                after = selected.len(),
                "filtered events"
            );
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::Classification;
    use crate::{Candle, Direction};

    fn event(index: usize, pattern: Pattern, tag: Option<&str>) -> Event {
        let mut bar = Candle::new(index as i64, 100.0, 102.0, 99.0, 101.0, 0.0);
        if let Some(tag) = tag {
            bar = bar.with_event_type(tag);
        }
        let classification = Classification {
            pattern,
            expected_direction: pattern.expected_direction(),
        };
        Event::from_bar(index, &bar, classification).unwrap()
    }

    fn events() -> Vec<Event> {
        vec![
            event(0, Pattern::Breakout, Some("earnings")),
            event(1, Pattern::Breakout, None),
            event(2, Pattern::Retest, Some("earnings")),
            event(3, Pattern::RawCandle, Some("partnership")),
        ]
    }

    fn ids(selected: &[&Event]) -> Vec<usize> {
        selected.iter().map(|e| e.id.index()).collect()
    }

    #[test]
    fn test_no_filter_passes_everything() {
        let events = events();
        assert_eq!(ids(&EventFilter::new().apply(&events)), [0, 1, 2, 3]);
    }

    #[test]
    fn test_pattern_filter() {
        let events = events();
        let filter = EventFilter::new().with_pattern(Pattern::Breakout);
        assert_eq!(ids(&filter.apply(&events)), [0, 1]);
    }

    #[test]
    fn test_event_type_filter_skips_untagged() {
        let events = events();
        let filter = EventFilter::new().event_type("earnings");
        assert_eq!(ids(&filter.apply(&events)), [0, 2]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let events = events();
        let filter = EventFilter::new().pattern("breakout").event_type("earnings");
        assert_eq!(ids(&filter.apply(&events)), [0]);
    }

    #[test]
    fn test_unknown_pattern_matches_nothing() {
        let events = events();
        let filter = EventFilter::new().pattern("double_top");
        assert!(filter.apply(&events).is_empty());
    }

    #[test]
    fn test_pattern_match_is_exact() {
        let events = events();
        assert!(EventFilter::new().pattern("Breakout").apply(&events).is_empty());
        assert_eq!(events[0].expected_direction, Some(Direction::Up));
    }
}
