//! Pattern classifier
//!
//! Each candidate candle is labeled by a fixed-priority cascade of rules,
//! evaluated top to bottom against the candle and its trailing window:
//!
//! 1. **breakout** (up): strong close above the window high
//! 2. **fakeout** (up): high pierces the window high, close falls back below it
//! 3. **retest** (up): low touches the window high, close holds above the midpoint,
//!    range contained
//! 4. **head_and_shoulders** (down): strong close below the window low
//! 5. **continuation** (up): close above the midpoint, meaningful move, expanded range
//!
//! The first matching rule wins. Rule conditions overlap (a breakout candle can
//! also satisfy continuation), so the order is part of the semantics. A candle
//! matching nothing is labeled `raw_candle` with no expected direction.

pub mod helpers;

pub mod downside;
pub mod upside;

use std::fmt;

use crate::params::ClassifierConfig;
use crate::window::WindowContext;
use crate::{Direction, OHLCVExt, Pattern, OHLCV};

/// Values of the candidate candle read by the rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub range: f64,
    pub body: f64,
    /// Unrounded open-to-close move in percent
    pub move_percent: f64,
}

impl Candidate {
    pub fn from_bar<T: OHLCV>(bar: &T) -> Self {
        Self {
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            range: OHLCVExt::range(bar),
            body: bar.body(),
            move_percent: bar.move_percent(),
        }
    }
}

/// Rule predicate over the candidate, its window and the thresholds
pub type Predicate = fn(&Candidate, &WindowContext, &ClassifierConfig) -> bool;

/// One entry of the cascade: when `predicate` holds, label `pattern` expecting `expected`
pub struct Rule {
    pub pattern: Pattern,
    pub expected: Direction,
    pub predicate: Predicate,
}

impl Rule {
    #[inline]
    pub fn matches(&self, c: &Candidate, ctx: &WindowContext, config: &ClassifierConfig) -> bool {
        (self.predicate)(c, ctx, config)
    }

    #[inline]
    pub fn classification(&self) -> Classification {
        Classification {
            pattern: self.pattern,
            expected_direction: Some(self.expected),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

/// The rule cascade, in priority order
pub const CASCADE: [Rule; 5] = [
    Rule {
        pattern: Pattern::Breakout,
        expected: Direction::Up,
        predicate: upside::breakout,
    },
    Rule {
        pattern: Pattern::Fakeout,
        expected: Direction::Up,
        predicate: upside::fakeout,
    },
    Rule {
        pattern: Pattern::Retest,
        expected: Direction::Up,
        predicate: upside::retest,
    },
    Rule {
        pattern: Pattern::HeadAndShoulders,
        expected: Direction::Down,
        predicate: downside::head_and_shoulders,
    },
    Rule {
        pattern: Pattern::Continuation,
        expected: Direction::Up,
        predicate: upside::continuation,
    },
];

/// Outcome of classifying one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub pattern: Pattern,
    pub expected_direction: Option<Direction>,
}

/// Label a candle against its window context. Total over well-formed candles.
pub fn classify<T: OHLCV>(
    bar: &T,
    ctx: &WindowContext,
    config: &ClassifierConfig,
) -> Classification {
    classify_candidate(&Candidate::from_bar(bar), ctx, config)
}

/// First matching rule wins; later rules are not evaluated.
pub fn classify_candidate(
    c: &Candidate,
    ctx: &WindowContext,
    config: &ClassifierConfig,
) -> Classification {
    CASCADE
        .iter()
        .find(|rule| rule.matches(c, ctx, config))
        .map(Rule::classification)
        .unwrap_or_default()
}
