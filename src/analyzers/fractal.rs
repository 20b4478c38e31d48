//! Fractal (swing point) detection
//!
//! A swing low is a bar whose low is strictly below the lows of the two bars on
//! each side; a swing high mirrors that on highs. High and low extremity are
//! checked independently, so one bar may produce both.

use std::collections::HashMap;

use super::helpers::{FRACTAL_SIDE, FRACTAL_WINDOW, SWING_STRENGTH_CAP};
use crate::params::{get_level, ParamMeta, ParamType, ParameterizedAnalyzer};
use crate::{AnalysisError, Analyzer, Result, SwingKind, SwingPoint, OHLC};

/// Bill Williams' 5-bar fractal detector
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FractalDetector {
    /// Swing points weaker than this are dropped. 0.0 keeps every fractal.
    pub min_strength: f64,
}

impl Default for FractalDetector {
    fn default() -> Self {
        Self { min_strength: 0.0 }
    }
}

impl FractalDetector {
    /// Detector that keeps only swings of at least `min_strength`
    pub fn with_min_strength(min_strength: f64) -> Self {
        Self { min_strength }
    }

    /// Scan for swing points, ordered by source index.
    ///
    /// Fewer than 5 bars yields an empty list; the first and last two bars can
    /// never be swing points.
    pub fn detect<T: OHLC>(&self, bars: &[T]) -> Vec<SwingPoint> {
        let mut swings = Vec::new();
        if bars.len() < FRACTAL_WINDOW {
            return swings;
        }

        for i in FRACTAL_SIDE..bars.len() - FRACTAL_SIDE {
            let current = &bars[i];
            let neighbors = [&bars[i - 2], &bars[i - 1], &bars[i + 1], &bars[i + 2]];

            let low = current.low();
            if neighbors.iter().all(|n| low < n.low()) {
                let mean = neighbors.iter().map(|n| n.low()).sum::<f64>() / 4.0;
                self.push_if_strong(
                    &mut swings,
                    SwingPoint {
                        kind: SwingKind::Low,
                        index: i,
                        price: low,
                        timestamp: current.timestamp(),
                        strength: swing_strength(low, mean),
                    },
                );
            }

            let high = current.high();
            if neighbors.iter().all(|n| high > n.high()) {
                let mean = neighbors.iter().map(|n| n.high()).sum::<f64>() / 4.0;
                self.push_if_strong(
                    &mut swings,
                    SwingPoint {
                        kind: SwingKind::High,
                        index: i,
                        price: high,
                        timestamp: current.timestamp(),
                        strength: swing_strength(high, mean),
                    },
                );
            }
        }

        tracing::trace!(bars = bars.len(), swings = swings.len(), "fractal scan");
        swings
    }

    fn push_if_strong(&self, swings: &mut Vec<SwingPoint>, swing: SwingPoint) {
        if swing.strength >= self.min_strength {
            swings.push(swing);
        }
    }

    /// Counts, support/resistance levels and advice for the detected swings.
    ///
    /// Unlike [`detect`](Self::detect) this refuses series shorter than the
    /// fractal window.
    pub fn summarize<T: OHLC>(&self, bars: &[T]) -> Result<FractalSummary> {
        if bars.len() < FRACTAL_WINDOW {
            return Err(AnalysisError::InsufficientData {
                need: FRACTAL_WINDOW,
                got: bars.len(),
            });
        }

        let swings = self.detect(bars);
        let highs: Vec<&SwingPoint> = swings.iter().filter(|s| s.is_high()).collect();
        let lows: Vec<&SwingPoint> = swings.iter().filter(|s| s.is_low()).collect();

        let latest = match swings.last() {
            Some(s) => format!("{} at {:.5}", kind_label(s.kind), s.price),
            None => "None at N/A".to_string(),
        };
        let analysis = format!(
            "Fractal Analysis Results:\n\
             - Total fractals detected: {}\n\
             - Swing highs: {}\n\
             - Swing lows: {}\n\
             - Analysis period: {} candles\n\
             - Latest fractal: {}",
            swings.len(),
            highs.len(),
            lows.len(),
            bars.len(),
            latest
        );

        let mut recommendations = Vec::new();
        if swings.is_empty() {
            recommendations.push("No fractal points detected - market may be in strong trend".to_string());
            recommendations.push("Wait for more price action to identify swing points".to_string());
        } else {
            if let Some(high) = highs.last() {
                recommendations.push(format!(
                    "Latest resistance level: {:.5} ({})",
                    high.price,
                    swing_when(high)
                ));
            }
            if let Some(low) = lows.last() {
                recommendations.push(format!(
                    "Latest support level: {:.5} ({})",
                    low.price,
                    swing_when(low)
                ));
            }
            if highs.len() >= 2 {
                recommendations.push("Multiple resistance levels identified - look for breakouts".to_string());
            }
            if lows.len() >= 2 {
                recommendations.push("Multiple support levels identified - monitor for bounces".to_string());
            }
            recommendations.push("Use fractal levels for stop-loss and take-profit placement".to_string());
            recommendations.push("Fractal breaks often lead to significant price moves".to_string());
        }

        Ok(FractalSummary {
            total: swings.len(),
            highs: highs.len(),
            lows: lows.len(),
            analysis,
            recommendations,
            swings,
        })
    }
}

fn kind_label(kind: SwingKind) -> &'static str {
    match kind {
        SwingKind::High => "HIGH",
        SwingKind::Low => "LOW",
    }
}

/// Timestamp of the swing when known, otherwise its bar index
fn swing_when(swing: &SwingPoint) -> String {
    match swing.timestamp {
        Some(ts) => format!("t={}", ts),
        None => format!("bar {}", swing.index),
    }
}

/// `min(|price - mean| / mean * 100, 10)`, 0.0 when the mean is zero
#[inline]
pub fn swing_strength(price: f64, neighbor_mean: f64) -> f64 {
    if !neighbor_mean.is_finite() || neighbor_mean.abs() <= f64::EPSILON {
        return 0.0;
    }
    let deviation = ((price - neighbor_mean) / neighbor_mean).abs() * 100.0;
    if deviation.is_nan() {
        0.0
    } else {
        deviation.min(SWING_STRENGTH_CAP)
    }
}

/// Detect swing points with the default detector
pub fn detect_fractals<T: OHLC>(bars: &[T]) -> Vec<SwingPoint> {
    FractalDetector::default().detect(bars)
}

/// Swing list with display-ready counts and advice
#[derive(Debug, Clone, serde::Serialize)]
pub struct FractalSummary {
    pub swings: Vec<SwingPoint>,
    pub total: usize,
    pub highs: usize,
    pub lows: usize,
    pub analysis: String,
    pub recommendations: Vec<String>,
}

impl Analyzer for FractalDetector {
    type Output = Vec<SwingPoint>;

    fn name(&self) -> &'static str {
        "FRACTALS"
    }

    fn min_bars(&self) -> usize {
        FRACTAL_WINDOW
    }

    fn analyze<T: OHLC>(&self, bars: &[T]) -> Self::Output {
        self.detect(bars)
    }

    fn validate_config(&self) -> Result<()> {
        if !(0.0..=SWING_STRENGTH_CAP).contains(&self.min_strength) {
            return Err(AnalysisError::OutOfRange {
                field: "min_strength",
                value: self.min_strength,
                min: 0.0,
                max: SWING_STRENGTH_CAP,
            });
        }
        Ok(())
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static FRACTAL_PARAMS: &[ParamMeta] = &[ParamMeta {
    name: "min_strength",
    param_type: ParamType::Level,
    default: 0.0,
    range: (0.0, 10.0, 0.5),
    description: "Drop swing points weaker than this strength",
}];

impl ParameterizedAnalyzer for FractalDetector {
    fn param_meta() -> &'static [ParamMeta] {
        FRACTAL_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_strength: get_level(params, "min_strength", 0.0, (0.0, SWING_STRENGTH_CAP))?,
        })
    }

    fn analyzer_name() -> &'static str {
        "FRACTALS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    fn lows(values: &[f64]) -> Vec<Candle> {
        values
            .iter()
            .map(|&l| Candle::new(l + 1.0, 50.0, l, l + 1.0))
            .collect()
    }

    #[test]
    fn test_too_few_bars() {
        assert!(detect_fractals(&lows(&[10.0, 12.0, 8.0, 13.0])).is_empty());
        assert!(detect_fractals::<Candle>(&[]).is_empty());
    }

    #[test]
    fn test_single_low() {
        let swings = detect_fractals(&lows(&[10.0, 12.0, 8.0, 13.0, 9.0]));
        assert_eq!(swings.len(), 1);
        assert_eq!(swings[0].kind, SwingKind::Low);
        assert_eq!(swings[0].index, 2);
        assert_eq!(swings[0].price, 8.0);
    }

    #[test]
    fn test_equal_neighbor_is_not_a_fractal() {
        assert!(detect_fractals(&lows(&[10.0, 8.0, 8.0, 13.0, 9.0])).is_empty());
    }

    #[test]
    fn test_swing_strength_uncapped_value() {
        // neighbors 100, 101, 101, 100 -> mean 100.5
        let s = swing_strength(99.5, 100.5);
        assert!((s - 1.0 / 100.5 * 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_swing_strength_zero_mean() {
        assert_eq!(swing_strength(-1.0, 0.0), 0.0);
    }

    #[test]
    fn test_min_strength_filter() {
        let bars = lows(&[100.0, 101.0, 99.5, 101.0, 100.0]);
        assert_eq!(FractalDetector::default().detect(&bars).len(), 1);
        assert!(FractalDetector::with_min_strength(2.0).detect(&bars).is_empty());
    }

    #[test]
    fn test_both_kinds_on_one_bar() {
        let bars = vec![
            Candle::new(10.0, 11.0, 9.0, 10.0),
            Candle::new(10.0, 11.0, 9.0, 10.0),
            Candle::new(10.0, 15.0, 5.0, 10.0),
            Candle::new(10.0, 11.0, 9.0, 10.0),
            Candle::new(10.0, 11.0, 9.0, 10.0),
        ];
        let swings = detect_fractals(&bars);
        assert_eq!(swings.len(), 2);
        assert!(swings.iter().all(|s| s.index == 2));
        assert_eq!(swings[0].kind, SwingKind::Low);
        assert_eq!(swings[1].kind, SwingKind::High);
    }

    #[test]
    fn test_summarize() {
        let summary = FractalDetector::default()
            .summarize(&lows(&[10.0, 12.0, 8.0, 13.0, 9.0]))
            .unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.lows, 1);
        assert_eq!(summary.highs, 0);
        assert!(summary.analysis.contains("Latest fractal: LOW at 8.00000"));
        assert_eq!(summary.recommendations[0], "Latest support level: 8.00000 (bar 2)");
    }

    #[test]
    fn test_summarize_prints_timestamps() {
        let bars: Vec<Candle> = lows(&[10.0, 12.0, 8.0, 13.0, 9.0])
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.at(1_700_000_000_000 + i as i64 * 60_000))
            .collect();
        let summary = FractalDetector::default().summarize(&bars).unwrap();
        assert_eq!(
            summary.recommendations[0],
            "Latest support level: 8.00000 (t=1700000120000)"
        );
    }

    #[test]
    fn test_summarize_without_swings() {
        let bars = vec![Candle::new(1.0, 2.0, 0.5, 1.5); 6];
        let summary = FractalDetector::default().summarize(&bars).unwrap();
        assert!(summary.analysis.contains("Latest fractal: None at N/A"));
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn test_summarize_requires_window() {
        let err = FractalDetector::default().summarize(&lows(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { need: 5, got: 2 }));
    }

    #[test]
    fn test_validate_config() {
        assert!(FractalDetector::default().validate_config().is_ok());
        assert!(FractalDetector::with_min_strength(11.0).validate_config().is_err());
        assert!(FractalDetector::with_min_strength(f64::NAN).validate_config().is_err());
    }
}
