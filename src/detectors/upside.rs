//! Rules expecting an upward move: breakout, fakeout, retest, continuation.

use super::helpers::{is_contained, is_expanded, is_strong};
use super::Candidate;
use crate::params::ClassifierConfig;
use crate::window::WindowContext;

/// Strong candle closing above the window high
pub fn breakout(c: &Candidate, ctx: &WindowContext, config: &ClassifierConfig) -> bool {
    c.close > ctx.highest_high && is_strong(c.body, c.range, config.strong_body_ratio.get())
}

/// Pierced the window high intraday but closed back below it
pub fn fakeout(c: &Candidate, ctx: &WindowContext, _config: &ClassifierConfig) -> bool {
    c.high > ctx.highest_high && c.close < ctx.highest_high
}

/// Dipped back to the window high and held above the midpoint, with contained range
pub fn retest(c: &Candidate, ctx: &WindowContext, config: &ClassifierConfig) -> bool {
    c.low <= ctx.highest_high
        && c.close > ctx.midpoint
        && is_contained(c.range, ctx.avg_range, config.retest_range_factor.get())
}

/// Closed in the upper half of the window on an expanded range with a real move
pub fn continuation(c: &Candidate, ctx: &WindowContext, config: &ClassifierConfig) -> bool {
    c.close > ctx.midpoint
        && c.move_percent.abs() > config.continuation_min_move.get()
        && is_expanded(c.range, ctx.avg_range)
}
