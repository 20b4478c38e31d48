//! Fractal trend classification from the latest pair of swings
//!
//! Compares the most recent swing high with the one before it, and likewise
//! for swing lows, then ranks the combination: higher highs and higher lows
//! make the strongest uptrend, one of the two a moderate one; the downtrend
//! tiers mirror that; anything else is sideways.

use std::collections::HashMap;

use super::fractal::FractalDetector;
use super::helpers::{
    clamp_unit, classify_move, moderate_confidence, relative_change, sideways_confidence,
    split_by_kind, strong_confidence, time_decay, FRACTAL_WINDOW,
};
use crate::params::{get_count, get_flag, get_ratio, ParamMeta, ParamType, ParameterizedAnalyzer};
use crate::{
    AnalysisError, Analyzer, Ratio, RecentSwings, Result, SequenceTrend, SwingPoint, TrendLabel,
    OHLC,
};

/// Swing-structure trend classifier over the latest two highs and lows
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FractalTrendClassifier {
    /// Swing highs and swing lows each required
    pub min_fractals: usize,
    /// Scale confidence by the time between the two latest highs
    pub use_time_decay: bool,
    /// Confidence below this adds a "wait for confirmation" recommendation.
    /// Never changes the label.
    pub confidence_threshold: Ratio,
}

impl Default for FractalTrendClassifier {
    fn default() -> Self {
        Self {
            min_fractals: 2,
            use_time_decay: true,
            confidence_threshold: Ratio::new_const(0.6),
        }
    }
}

/// Latest-vs-previous swing comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct PairComparison {
    pub is_higher_high: bool,
    pub is_lower_high: bool,
    pub is_higher_low: bool,
    pub is_lower_low: bool,
    /// Relative change between the two latest highs (0.0 if fewer than two)
    pub high_change: f64,
    /// Relative change between the two latest lows (0.0 if fewer than two)
    pub low_change: f64,
    /// Sum of `|change| * 50` over non-neutral comparisons, 0..=100
    pub pattern_strength: f64,
}

impl PairComparison {
    /// Compare the latest two highs and the latest two lows
    pub fn from_recent(recent: &RecentSwings) -> Self {
        let mut cmp = Self::default();
        let mut strength = 0.0;

        if let (Some(last), Some(prev)) = (recent.last_high, recent.previous_high) {
            cmp.high_change = relative_change(prev.price, last.price);
            match classify_move(cmp.high_change) {
                SequenceTrend::Ascending => cmp.is_higher_high = true,
                SequenceTrend::Descending => cmp.is_lower_high = true,
                SequenceTrend::Sideways => {}
            }
            if cmp.is_higher_high || cmp.is_lower_high {
                strength += cmp.high_change.abs() * 50.0;
            }
        }

        if let (Some(last), Some(prev)) = (recent.last_low, recent.previous_low) {
            cmp.low_change = relative_change(prev.price, last.price);
            match classify_move(cmp.low_change) {
                SequenceTrend::Ascending => cmp.is_higher_low = true,
                SequenceTrend::Descending => cmp.is_lower_low = true,
                SequenceTrend::Sideways => {}
            }
            if cmp.is_higher_low || cmp.is_lower_low {
                strength += cmp.low_change.abs() * 50.0;
            }
        }

        cmp.pattern_strength = strength.min(100.0);
        cmp
    }
}

/// Outcome of the fractal trend classifier
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FractalTrendResult {
    pub trend: TrendLabel,
    /// 0.0..=1.0, after time decay
    pub confidence: f64,
    pub pattern: String,
    pub recent: RecentSwings,
    pub comparison: PairComparison,
    /// Tier-scaled pattern strength, 0..=100
    pub pattern_strength: f64,
    /// `pattern_strength / 100`
    pub trend_strength: f64,
    /// Factor applied to confidence (1.0 when decay is off or not applicable)
    pub time_decay: f64,
    pub analysis: String,
    pub recommendations: Vec<String>,
}

impl FractalTrendResult {
    pub(crate) fn insufficient(recent: RecentSwings, pattern: &str, analysis: String) -> Self {
        Self {
            trend: TrendLabel::InsufficientData,
            confidence: 0.0,
            pattern: pattern.to_string(),
            recent,
            comparison: PairComparison::default(),
            pattern_strength: 0.0,
            trend_strength: 0.0,
            time_decay: 1.0,
            analysis,
            recommendations: vec!["Wait for more price data to perform fractal trend analysis".to_string()],
        }
    }
}

impl FractalTrendClassifier {
    pub fn classify<T: OHLC>(&self, bars: &[T]) -> FractalTrendResult {
        if bars.len() < FRACTAL_WINDOW {
            tracing::debug!(bars = bars.len(), "not enough bars for fractal trend");
            return FractalTrendResult::insufficient(
                RecentSwings::default(),
                "Insufficient data for fractal analysis",
                format!(
                    "Need at least {} candles for fractal analysis, got {}",
                    FRACTAL_WINDOW,
                    bars.len()
                ),
            );
        }

        let swings = FractalDetector::default().detect(bars);
        let (highs, lows) = split_by_kind(&swings);
        let recent = RecentSwings::from_sequences(&highs, &lows);

        if highs.len() < self.min_fractals || lows.len() < self.min_fractals {
            tracing::debug!(
                highs = highs.len(),
                lows = lows.len(),
                min = self.min_fractals,
                "not enough swings for fractal trend"
            );
            return FractalTrendResult::insufficient(
                recent,
                "Insufficient fractals for trend analysis",
                format!(
                    "Need at least {} swing highs and {} swing lows. Found {} highs, {} lows",
                    self.min_fractals,
                    self.min_fractals,
                    highs.len(),
                    lows.len()
                ),
            );
        }

        let cmp = PairComparison::from_recent(&recent);
        let s = cmp.pattern_strength;

        let (trend, pattern, confidence, pattern_strength) =
            if cmp.is_higher_high && cmp.is_higher_low {
                (TrendLabel::Uptrend, "Higher Highs + Higher Lows", strong_confidence(s), s)
            } else if cmp.is_higher_high || cmp.is_higher_low {
                let pattern = if cmp.is_higher_high { "Higher Highs" } else { "Higher Lows" };
                (TrendLabel::Uptrend, pattern, moderate_confidence(s), s * 0.7)
            } else if cmp.is_lower_high && cmp.is_lower_low {
                (TrendLabel::Downtrend, "Lower Highs + Lower Lows", strong_confidence(s), s)
            } else if cmp.is_lower_high || cmp.is_lower_low {
                let pattern = if cmp.is_lower_high { "Lower Highs" } else { "Lower Lows" };
                (TrendLabel::Downtrend, pattern, moderate_confidence(s), s * 0.7)
            } else {
                (TrendLabel::Sideways, "Mixed Signals", sideways_confidence(s), s * 0.3)
            };

        // Decay is keyed off the highs whichever side drove the label.
        let decay = match (self.use_time_decay, recent.last_high, recent.previous_high) {
            (true, Some(last), Some(prev)) => time_decay(&last, &prev),
            _ => 1.0,
        };
        let confidence = clamp_unit(confidence * decay);

        let analysis = self.analysis_text(&highs, &lows, &cmp, trend, pattern, confidence, decay);
        let recommendations = self.recommendations(trend, confidence, &recent);

        FractalTrendResult {
            trend,
            confidence,
            pattern: pattern.to_string(),
            recent,
            comparison: cmp,
            pattern_strength,
            trend_strength: clamp_unit(pattern_strength / 100.0),
            time_decay: decay,
            analysis,
            recommendations,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn analysis_text(
        &self,
        highs: &[SwingPoint],
        lows: &[SwingPoint],
        cmp: &PairComparison,
        trend: TrendLabel,
        pattern: &str,
        confidence: f64,
        decay: f64,
    ) -> String {
        let describe = |seq: &[SwingPoint], change: f64| match seq {
            [.., prev, last] => format!(
                "{:.5} (bar {}) vs {:.5} (bar {}), {:+.3}%",
                last.price,
                last.index,
                prev.price,
                prev.index,
                change * 100.0
            ),
            [last] => format!("{:.5} (bar {}), no earlier swing", last.price, last.index),
            [] => "none".to_string(),
        };

        format!(
            "Fractal Trend Analysis ({} swing highs, {} swing lows):\n\
             - Latest high: {}\n\
             - Latest low: {}\n\
             - Pattern: {}\n\
             - Trend: {} with {:.1}% confidence\n\
             - Time decay factor: {:.3}",
            highs.len(),
            lows.len(),
            describe(highs, cmp.high_change),
            describe(lows, cmp.low_change),
            pattern,
            trend,
            confidence * 100.0,
            decay
        )
    }

    fn recommendations(&self, trend: TrendLabel, confidence: f64, recent: &RecentSwings) -> Vec<String> {
        let mut recs = Vec::new();
        let strong = confidence >= 0.8;

        match trend {
            TrendLabel::Uptrend => {
                if strong {
                    recs.push("Strong bullish swing structure - consider long positions".to_string());
                    recs.push("Look for pullbacks toward the latest swing low as entries".to_string());
                } else {
                    recs.push("Developing uptrend - consider long positions with caution".to_string());
                    recs.push("Wait for a confirmed higher low before adding exposure".to_string());
                }
                if let Some(low) = recent.last_low {
                    recs.push(format!("Protective stop below the latest swing low at {:.5}", low.price));
                }
            }
            TrendLabel::Downtrend => {
                if strong {
                    recs.push("Strong bearish swing structure - consider short positions".to_string());
                    recs.push("Look for rallies toward the latest swing high as entries".to_string());
                } else {
                    recs.push("Developing downtrend - consider short positions with caution".to_string());
                    recs.push("Wait for a confirmed lower high before adding exposure".to_string());
                }
                if let Some(high) = recent.last_high {
                    recs.push(format!("Protective stop above the latest swing high at {:.5}", high.price));
                }
            }
            TrendLabel::Sideways => {
                recs.push("No clear swing structure - avoid trend-following entries".to_string());
                if let (Some(high), Some(low)) = (recent.last_high, recent.last_low) {
                    recs.push(format!("Range between {:.5} and {:.5} - trade the boundaries", low.price, high.price));
                }
                recs.push("Look for a break of the latest swing high or low".to_string());
            }
            TrendLabel::InsufficientData => {}
        }

        let threshold = self.confidence_threshold.get();
        if confidence < threshold {
            recs.push(format!(
                "Confidence {:.1}% is below the {:.1}% threshold - wait for confirmation",
                confidence * 100.0,
                threshold * 100.0
            ));
        }

        recs.push("Always use proper risk management and stop-loss orders".to_string());
        recs.push("Consider market volatility and news events".to_string());
        recs
    }
}

impl Analyzer for FractalTrendClassifier {
    type Output = FractalTrendResult;

    fn name(&self) -> &'static str {
        "FRACTAL_TREND"
    }

    fn min_bars(&self) -> usize {
        FRACTAL_WINDOW
    }

    fn analyze<T: OHLC>(&self, bars: &[T]) -> Self::Output {
        self.classify(bars)
    }

    fn validate_config(&self) -> Result<()> {
        if self.min_fractals == 0 {
            return Err(AnalysisError::InvalidValue("min_fractals must be > 0"));
        }
        Ok(())
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static FRACTAL_TREND_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "min_fractals",
        param_type: ParamType::Count,
        default: 2.0,
        range: (1.0, 6.0, 1.0),
        description: "Swing highs and swing lows each required",
    },
    ParamMeta {
        name: "use_time_decay",
        param_type: ParamType::Flag,
        default: 1.0,
        range: (0.0, 1.0, 1.0),
        description: "Decay confidence by the gap between the latest two highs",
    },
    ParamMeta {
        name: "confidence_threshold",
        param_type: ParamType::Ratio,
        default: 0.6,
        range: (0.4, 0.9, 0.1),
        description: "Confidence below which confirmation is advised",
    },
];

impl ParameterizedAnalyzer for FractalTrendClassifier {
    fn param_meta() -> &'static [ParamMeta] {
        FRACTAL_TREND_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_fractals: get_count(params, "min_fractals", 2)?,
            use_time_decay: get_flag(params, "use_time_decay", true),
            confidence_threshold: get_ratio(params, "confidence_threshold", 0.6)?,
        })
    }

    fn analyzer_name() -> &'static str {
        "FRACTAL_TREND"
    }
}
