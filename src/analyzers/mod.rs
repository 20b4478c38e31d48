//! Analysis components
//!
//! - **Fractal detector**: 5-bar swing highs/lows (Bill Williams' fractals).
//! - **Moving-average classifier**: price vs. trailing SMA tallies.
//! - **Fractal trend classifier**: latest vs. previous swing of each kind.
//! - **Enhanced fractal trend classifier**: every consecutive swing pair of each kind.

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple analyzer types.
macro_rules! impl_with_defaults {
  ($($analyzer:ty),* $(,)?) => {
    $(impl $analyzer {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod enhanced;
pub mod fractal;
pub mod fractal_trend;
pub mod moving_average;

impl_with_defaults!(
    fractal::FractalDetector,
    moving_average::MovingAverageClassifier,
    fractal_trend::FractalTrendClassifier,
    enhanced::EnhancedFractalTrendClassifier,
);

// Re-export all analyzers for convenience
pub use enhanced::*;
pub use fractal::*;
pub use fractal_trend::*;
pub use helpers::*;
pub use moving_average::*;
