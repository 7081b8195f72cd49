//! Classifier configuration and parameter metadata
//!
//! [`ClassifierConfig`] carries every tunable of the window builder and the
//! rule cascade. It is passed explicitly, so alternate configurations can be
//! evaluated side by side. Parameter metadata enables:
//! - Grid search over thresholds
//! - Parameter documentation
//! - Building a config from loosely-typed key/value input
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use candle_events::params::ClassifierConfig;
//!
//! let mut params = HashMap::new();
//! params.insert("lookback", 20.0);
//!
//! let config = ClassifierConfig::with_params(&params).unwrap();
//! assert_eq!(config.lookback.get(), 20);
//! assert_eq!(config.strong_body_ratio.get(), 0.6);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::detectors::helpers;
use crate::{AnalysisError, Factor, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value (0.0..=1.0)
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Non-negative multiplier or percent threshold
  Factor,
}

/// Metadata for a single classifier parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "strong_body_ratio")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn factor(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Factor, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    if step <= 0.0 || step.is_nan() {
      return values;
    }
    let mut v = min;
    while v <= max + f64::EPSILON {
      values.push(v);
      v += step;
    }
    values
  }

  /// Validate a value against the optimization range and the parameter type
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(AnalysisError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ratio::new(value).map(|_| ()),
      ParamType::Factor => Factor::new(value).map(|_| ()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(AnalysisError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

const PARAMS: [ParamMeta; 4] = [
  ParamMeta::period(
    "lookback",
    helpers::DEFAULT_LOOKBACK as f64,
    (5.0, 50.0, 5.0),
    "Number of preceding candles summarized for each candidate",
  ),
  ParamMeta::ratio(
    "strong_body_ratio",
    helpers::STRONG_BODY_RATIO,
    (0.4, 0.8, 0.1),
    "Body must exceed this share of the range for a strong candle",
  ),
  ParamMeta::factor(
    "retest_range_factor",
    helpers::RETEST_RANGE_FACTOR,
    (0.8, 2.0, 0.2),
    "Retest range must stay below window average range times this factor",
  ),
  ParamMeta::factor(
    "continuation_min_move",
    helpers::CONTINUATION_MIN_MOVE,
    (0.1, 1.0, 0.1),
    "Minimum absolute open-to-close move, in percent, for a continuation",
  ),
];

// ============================================================
// CLASSIFIER CONFIG
// ============================================================

/// Tunables of the window builder and rule cascade.
///
/// Deserializes field by field with defaults, through the validating newtypes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
  pub lookback: Period,
  pub strong_body_ratio: Ratio,
  pub retest_range_factor: Factor,
  pub continuation_min_move: Factor,
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self {
      lookback: Period::new_const(helpers::DEFAULT_LOOKBACK),
      strong_body_ratio: Ratio::new_const(helpers::STRONG_BODY_RATIO),
      retest_range_factor: Factor::new_const(helpers::RETEST_RANGE_FACTOR),
      continuation_min_move: Factor::new_const(helpers::CONTINUATION_MIN_MOVE),
    }
  }
}

impl ClassifierConfig {
  /// Returns metadata for all configurable parameters
  pub fn param_meta() -> &'static [ParamMeta] {
    &PARAMS
  }

  /// Creates a config from a HashMap. Missing parameters use their default values;
  /// unknown keys are rejected.
  pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    if let Some(unknown) = params.keys().find(|k| !PARAMS.iter().any(|m| m.name == **k)) {
      return Err(AnalysisError::InvalidConfig(format!("unknown parameter `{unknown}`")));
    }

    Ok(Self {
      lookback: get_period(params, "lookback", helpers::DEFAULT_LOOKBACK)?,
      strong_body_ratio: get_ratio(params, "strong_body_ratio", helpers::STRONG_BODY_RATIO)?,
      retest_range_factor: get_factor(
        params,
        "retest_range_factor",
        helpers::RETEST_RANGE_FACTOR,
      )?,
      continuation_min_move: get_factor(
        params,
        "continuation_min_move",
        helpers::CONTINUATION_MIN_MOVE,
      )?,
    })
  }

  /// Re-check every value through its validating constructor
  pub fn validate(&self) -> Result<()> {
    Period::new(self.lookback.get())?;
    Ratio::new(self.strong_body_ratio.get())?;
    Factor::new(self.retest_range_factor.get())?;
    Factor::new(self.continuation_min_move.get())?;
    Ok(())
  }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a Factor from params with default fallback
pub fn get_factor(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Factor> {
  let value = params.get(key).copied().unwrap_or(default);
  Factor::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let Some(value) = params.get(key).copied() else {
    return Period::new(default);
  };
  if value < 1.0 || value.fract() != 0.0 || !value.is_finite() {
    return Err(AnalysisError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_param_meta_lists_all_tunables() {
    let names: Vec<_> = ClassifierConfig::param_meta().iter().map(|m| m.name).collect();
    assert_eq!(
      names,
      ["lookback", "strong_body_ratio", "retest_range_factor", "continuation_min_move"]
    );
  }

  #[test]
  fn test_param_defaults_match_config_default() {
    let config = ClassifierConfig::default();
    let meta = ClassifierConfig::param_meta();

    assert_eq!(meta[0].default, config.lookback.get() as f64);
    assert_eq!(meta[1].default, config.strong_body_ratio.get());
    assert_eq!(meta[2].default, config.retest_range_factor.get());
    assert_eq!(meta[3].default, config.continuation_min_move.get());
  }

  #[test]
  fn test_generate_grid() {
    let meta = ParamMeta::ratio("test", 0.5, (0.3, 0.7, 0.2), "Test");

    let grid = meta.generate_grid();
    assert_eq!(grid.len(), 3);
    assert!((grid[0] - 0.3).abs() < f64::EPSILON);
    assert!((grid[1] - 0.5).abs() < f64::EPSILON);
    assert!((grid[2] - 0.7).abs() < f64::EPSILON);
  }

  #[test]
  fn test_generate_grid_non_positive_step_is_empty() {
    assert!(ParamMeta::ratio("test", 0.5, (0.3, 0.7, 0.0), "Test").generate_grid().is_empty());
    assert!(ParamMeta::factor("test", 1.0, (0.5, 2.0, -0.5), "Test").generate_grid().is_empty());
  }

  #[test]
  fn test_validate_ratio() {
    let meta = ParamMeta::ratio("test", 0.5, (0.3, 0.7, 0.1), "Test");

    assert!(meta.validate(0.5).is_ok());
    assert!(meta.validate(0.3).is_ok());
    assert!(meta.validate(0.7).is_ok());
    assert!(meta.validate(0.2).is_err());
    assert!(meta.validate(0.8).is_err());
  }

  #[test]
  fn test_validate_period() {
    let meta = ParamMeta::period("test", 10.0, (5.0, 50.0, 5.0), "Test");

    assert!(meta.validate(10.0).is_ok());
    assert!(meta.validate(12.5).is_err());
    assert!(meta.validate(60.0).is_err());
  }

  #[test]
  fn test_with_params_overrides_and_defaults() {
    let mut params = HashMap::new();
    params.insert("lookback", 20.0);
    params.insert("retest_range_factor", 1.5);

    let config = ClassifierConfig::with_params(&params).unwrap();
    assert_eq!(config.lookback.get(), 20);
    assert_eq!(config.retest_range_factor.get(), 1.5);
    assert_eq!(config.strong_body_ratio.get(), 0.6);
    assert_eq!(config.continuation_min_move.get(), 0.2);
  }

  #[test]
  fn test_with_params_rejects_unknown_and_invalid() {
    let mut params = HashMap::new();
    params.insert("lookbak", 20.0);
    assert!(matches!(
      ClassifierConfig::with_params(&params),
      Err(AnalysisError::InvalidConfig(_))
    ));

    let mut params = HashMap::new();
    params.insert("strong_body_ratio", 1.5);
    assert!(ClassifierConfig::with_params(&params).is_err());

    let mut params = HashMap::new();
    params.insert("lookback", 0.0);
    assert!(ClassifierConfig::with_params(&params).is_err());
  }

  #[test]
  fn test_get_period_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 20.0);

    assert_eq!(get_period(&params, "key1", 14).unwrap().get(), 20);
    assert_eq!(get_period(&params, "key2", 14).unwrap().get(), 14);
  }
}
