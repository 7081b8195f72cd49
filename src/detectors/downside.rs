//! Rules expecting a downward move.

use super::helpers::is_strong;
use super::Candidate;
use crate::params::ClassifierConfig;
use crate::window::WindowContext;

/// Strong candle closing below the window low.
///
/// A reversal proxy; no three-peak structure is detected.
pub fn head_and_shoulders(c: &Candidate, ctx: &WindowContext, config: &ClassifierConfig) -> bool {
    c.close < ctx.lowest_low && is_strong(c.body, c.range, config.strong_body_ratio.get())
}
