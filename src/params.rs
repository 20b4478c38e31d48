//! Parameter metadata for analyzers
//!
//! This module provides metadata about analyzer parameters, enabling:
//! - Grid search over classifier settings
//! - Parameter documentation
//! - Automatic configuration UI generation
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use swingtrend::prelude::*;
//!
//! // Get parameter metadata for an analyzer
//! for param in MovingAverageClassifier::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! // Build one from a flat parameter map; missing keys take defaults
//! let mut params = HashMap::new();
//! params.insert("period", 14.0);
//! let classifier = MovingAverageClassifier::with_params(&params).unwrap();
//! assert_eq!(classifier.period.get(), 14);
//! ```

use std::collections::HashMap;

use crate::{AnalysisError, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value in 0.0..=1.0
  Ratio,
  /// Period value (positive integer bar count)
  Period,
  /// Positive integer count (e.g. required swing points)
  Count,
  /// Boolean switch encoded as 0.0 / 1.0
  Flag,
  /// Real value bounded by the parameter range
  Level,
}

/// Metadata for a single analyzer parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "threshold")
  pub name: &'static str,
  pub param_type: ParamType,
  /// Default value
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  /// Create a new ParamMeta for a Ratio parameter
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  /// Create a new ParamMeta for a Period parameter
  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  /// Create a new ParamMeta for an on/off switch
  pub const fn flag(name: &'static str, default: bool, description: &'static str) -> Self {
    Self {
      name,
      param_type: ParamType::Flag,
      default: if default { 1.0 } else { 0.0 },
      range: (0.0, 1.0, 1.0),
      description,
    }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    if step <= 0.0 {
      values.push(min);
      return values;
    }
    let mut v = min;
    while v <= max + f64::EPSILON {
      values.push(v);
      v += step;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(AnalysisError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio | ParamType::Level => Ok(()),
      ParamType::Period | ParamType::Count => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(AnalysisError::InvalidValue("Period/count must be a positive integer"));
        }
        Ok(())
      },
      ParamType::Flag => {
        if value != 0.0 && value != 1.0 {
          return Err(AnalysisError::InvalidValue("Flag must be 0 or 1"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED ANALYZER TRAIT
// ============================================================

/// Trait for analyzers that support parameterization
///
/// Implementing this trait enables:
/// - Discovery of available parameters
/// - Creation of analyzers with custom parameter values
/// - Grid search optimization
pub trait ParameterizedAnalyzer: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates an analyzer with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  /// Returns the analyzer name
  fn analyzer_name() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  Period::new(value as usize)
}

/// Helper to get a positive count from params with default fallback
pub fn get_count(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<usize> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if !value.is_finite() || value < 1.0 {
    return Err(AnalysisError::InvalidValue("Count must be >= 1"));
  }
  Ok(value as usize)
}

/// Helper to get a flag from params with default fallback; any non-zero value is on
pub fn get_flag(params: &HashMap<&str, f64>, key: &str, default: bool) -> bool {
  params.get(key).map(|v| *v != 0.0).unwrap_or(default)
}

/// Helper to get a bounded real from params with default fallback
pub fn get_level(
  params: &HashMap<&str, f64>,
  key: &'static str,
  default: f64,
  (min, max): (f64, f64),
) -> Result<f64> {
  let value = params.get(key).copied().unwrap_or(default);
  if value.is_nan() || value < min || value > max {
    return Err(AnalysisError::OutOfRange { field: key, value, min, max });
  }
  Ok(value)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_param_meta_ratio() {
    let meta = ParamMeta::ratio("threshold", 0.55, (0.5, 0.8, 0.05), "Trend share threshold");

    assert_eq!(meta.name, "threshold");
    assert_eq!(meta.param_type, ParamType::Ratio);
    assert_eq!(meta.default, 0.55);
  }

  #[test]
  fn test_param_meta_period() {
    let meta = ParamMeta::period("period", 20.0, (10.0, 30.0, 5.0), "MA lookback");

    assert_eq!(meta.name, "period");
    assert_eq!(meta.param_type, ParamType::Period);
    assert_eq!(meta.default, 20.0);
  }

  #[test]
  fn test_param_meta_flag() {
    let meta = ParamMeta::flag("weighted", true, "Weighted strength");
    assert_eq!(meta.default, 1.0);
    assert_eq!(meta.generate_grid(), vec![0.0, 1.0]);
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
  fn test_validate_period() {
    let meta = ParamMeta::period("period", 20.0, (10.0, 30.0, 5.0), "Test");

    assert!(meta.validate(20.0).is_ok());
    assert!(meta.validate(10.0).is_ok());
    assert!(meta.validate(12.5).is_err());
    assert!(meta.validate(8.0).is_err());
    assert!(meta.validate(31.0).is_err());
  }

  #[test]
  fn test_validate_flag() {
    let meta = ParamMeta::flag("use_time_decay", true, "Test");
    assert!(meta.validate(0.0).is_ok());
    assert!(meta.validate(1.0).is_ok());
    assert!(meta.validate(0.5).is_err());
  }

  #[test]
  fn test_get_ratio_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 0.8);

    assert!((get_ratio(&params, "key1", 0.5).unwrap().get() - 0.8).abs() < f64::EPSILON);
    assert!((get_ratio(&params, "key2", 0.5).unwrap().get() - 0.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_get_period_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 14.0);

    assert_eq!(get_period(&params, "key1", 20).unwrap().get(), 14);
    assert_eq!(get_period(&params, "key2", 20).unwrap().get(), 20);
  }

  #[test]
  fn test_get_count_and_flag_helpers() {
    let mut params = HashMap::new();
    params.insert("min_fractals", 4.0);
    params.insert("use_time_decay", 0.0);
    params.insert("bad", 0.0);

    assert_eq!(get_count(&params, "min_fractals", 2).unwrap(), 4);
    assert!(get_count(&params, "bad", 2).is_err());
    assert!(!get_flag(&params, "use_time_decay", true));
    assert!(get_flag(&params, "missing", true));
  }

  #[test]
  fn test_get_level_helper() {
    let mut params = HashMap::new();
    params.insert("min_strength", 12.0);

    assert!(get_level(&params, "min_strength", 0.0, (0.0, 10.0)).is_err());
    assert_eq!(get_level(&params, "other", 2.5, (0.0, 10.0)).unwrap(), 2.5);
  }
}
