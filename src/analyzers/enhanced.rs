//! Enhanced fractal trend classification over complete swing sequences
//!
//! Instead of the latest pair only, every consecutive pair of swing highs and
//! every consecutive pair of swing lows is classified as an ascending,
//! descending or neutral move. Each sequence gets an overall direction, a
//! strength and a consistency score; the two sequences together pick the trend.

use std::collections::HashMap;

use super::fractal::FractalDetector;
use super::helpers::{
    clamp_unit, classify_move, moderate_confidence, relative_change, sideways_confidence,
    split_by_kind, strong_confidence, time_decay, FRACTAL_WINDOW, SWING_STRENGTH_CAP,
};
use crate::params::{
    get_count, get_flag, get_level, get_ratio, ParamMeta, ParamType, ParameterizedAnalyzer,
};
use crate::{
    AnalysisError, Analyzer, Ratio, RecentSwings, Result, SequenceTrend, SwingPoint, TrendLabel,
    OHLC,
};

/// Share of directional moves one side needs to give a sequence a direction
pub const SEQUENCE_TREND_RATIO: f64 = 0.6;
/// Mean sequence consistency the strong tiers require
pub const STRONG_CONSISTENCY: f64 = 70.0;

/// Full-sequence fractal trend classifier
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnhancedFractalTrendClassifier {
    pub min_fractals: usize,
    pub use_time_decay: bool,
    pub confidence_threshold: Ratio,
    /// Forwarded to the detector as its minimum swing strength
    pub strength_threshold: f64,
}

impl Default for EnhancedFractalTrendClassifier {
    fn default() -> Self {
        Self {
            min_fractals: 3,
            use_time_decay: true,
            confidence_threshold: Ratio::new_const(0.6),
            strength_threshold: 0.0,
        }
    }
}

// ============================================================
// SEQUENCE STATISTICS
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MoveCount {
    pub ascending: usize,
    pub descending: usize,
    /// Directional moves only; neutral pairs are not counted
    pub total: usize,
}

/// Aggregate over one ordered run of same-kind swing points
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct SequenceStats {
    pub overall_trend: SequenceTrend,
    /// 0..=100
    pub trend_strength: f64,
    /// Longest same-direction run
    pub consecutive_moves: usize,
    /// Mean move magnitude, in percent
    pub average_move: f64,
    /// `|ascending ratio - descending ratio| * 100`
    pub consistency: f64,
    pub move_count: MoveCount,
    pub max_consecutive_ascending: usize,
    pub max_consecutive_descending: usize,
    pub recent_direction: SequenceTrend,
    pub sequence_length: usize,
}

impl SequenceStats {
    fn empty(sequence_length: usize) -> Self {
        Self {
            sequence_length,
            ..Self::default()
        }
    }

    /// Percentage of directional moves going `direction`
    pub fn move_share(&self, direction: SequenceTrend) -> f64 {
        if self.move_count.total == 0 {
            return 0.0;
        }
        let n = match direction {
            SequenceTrend::Ascending => self.move_count.ascending,
            SequenceTrend::Descending => self.move_count.descending,
            SequenceTrend::Sideways => return 0.0,
        };
        n as f64 / self.move_count.total as f64 * 100.0
    }
}

/// Walk every consecutive pair of a same-kind swing sequence
pub fn analyze_sequence(sequence: &[SwingPoint]) -> SequenceStats {
    if sequence.len() < 2 {
        return SequenceStats::empty(sequence.len());
    }

    let mut ascending = 0usize;
    let mut descending = 0usize;
    let mut total_move = 0.0;
    let mut run_up = 0usize;
    let mut run_down = 0usize;
    let mut max_up = 0usize;
    let mut max_down = 0usize;
    let mut recent_direction = SequenceTrend::Sideways;

    for (i, pair) in sequence.windows(2).enumerate() {
        let change = relative_change(pair[0].price, pair[1].price);
        total_move += change.abs();

        let direction = classify_move(change);
        match direction {
            SequenceTrend::Ascending => {
                ascending += 1;
                run_up += 1;
                run_down = 0;
                max_up = max_up.max(run_up);
            }
            SequenceTrend::Descending => {
                descending += 1;
                run_down += 1;
                run_up = 0;
                max_down = max_down.max(run_down);
            }
            SequenceTrend::Sideways => {
                run_up = 0;
                run_down = 0;
            }
        }

        // pair i ends at sequence[i + 1]; the last three pairs overwrite in order
        if i + 1 + 3 >= sequence.len() {
            recent_direction = direction;
        }
    }

    let total = ascending + descending;
    let (average_move, asc_ratio, desc_ratio) = if total > 0 {
        (
            total_move / total as f64,
            ascending as f64 / total as f64,
            descending as f64 / total as f64,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let overall_trend = if asc_ratio > SEQUENCE_TREND_RATIO {
        SequenceTrend::Ascending
    } else if desc_ratio > SEQUENCE_TREND_RATIO {
        SequenceTrend::Descending
    } else {
        SequenceTrend::Sideways
    };

    let balance = (asc_ratio - desc_ratio).abs();
    let consecutive_moves = max_up.max(max_down);
    let trend_strength = (asc_ratio.max(desc_ratio) * 50.0
        + consecutive_moves as f64 * 8.0
        + average_move * 200.0
        + balance * 30.0)
        .min(100.0);

    SequenceStats {
        overall_trend,
        trend_strength,
        consecutive_moves,
        average_move: average_move * 100.0,
        consistency: balance * 100.0,
        move_count: MoveCount {
            ascending,
            descending,
            total,
        },
        max_consecutive_ascending: max_up,
        max_consecutive_descending: max_down,
        recent_direction,
        sequence_length: sequence.len(),
    }
}

// ============================================================
// COMBINED PATTERN
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct EnhancedPattern {
    pub is_higher_high: bool,
    pub is_lower_high: bool,
    pub is_higher_low: bool,
    pub is_lower_low: bool,
    /// Mean of the two sequence strengths, 0..=100
    pub pattern_strength: f64,
    /// Mean of the two sequence consistencies, 0..=100
    pub trend_consistency: f64,
}

/// Per-sequence breakdown backing an enhanced result
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct EnhancedDetail {
    pub high_sequence: Vec<SwingPoint>,
    pub low_sequence: Vec<SwingPoint>,
    pub high_stats: SequenceStats,
    pub low_stats: SequenceStats,
    pub overall: EnhancedPattern,
}

impl EnhancedDetail {
    pub fn from_swings(swings: &[SwingPoint]) -> Self {
        let (high_sequence, low_sequence) = split_by_kind(swings);
        let high_stats = analyze_sequence(&high_sequence);
        let low_stats = analyze_sequence(&low_sequence);

        let overall = EnhancedPattern {
            is_higher_high: high_stats.overall_trend == SequenceTrend::Ascending,
            is_lower_high: high_stats.overall_trend == SequenceTrend::Descending,
            is_higher_low: low_stats.overall_trend == SequenceTrend::Ascending,
            is_lower_low: low_stats.overall_trend == SequenceTrend::Descending,
            pattern_strength: (high_stats.trend_strength + low_stats.trend_strength) / 2.0,
            trend_consistency: (high_stats.consistency + low_stats.consistency) / 2.0,
        };

        Self {
            high_sequence,
            low_sequence,
            high_stats,
            low_stats,
            overall,
        }
    }

    pub fn recent(&self) -> RecentSwings {
        RecentSwings::from_sequences(&self.high_sequence, &self.low_sequence)
    }

    fn max_consecutive(&self) -> usize {
        self.high_stats
            .max_consecutive_ascending
            .max(self.high_stats.max_consecutive_descending)
    }
}

/// Outcome of the enhanced classifier
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EnhancedFractalTrendResult {
    pub trend: TrendLabel,
    pub confidence: f64,
    pub pattern: String,
    pub recent: RecentSwings,
    /// `pattern_strength / 100`, 0..=1
    pub trend_strength: f64,
    pub time_decay: f64,
    pub analysis: String,
    pub recommendations: Vec<String>,
    pub detail: EnhancedDetail,
}

impl EnhancedFractalTrendClassifier {
    fn detector(&self) -> FractalDetector {
        FractalDetector::with_min_strength(self.strength_threshold)
    }

    pub fn classify<T: OHLC>(&self, bars: &[T]) -> EnhancedFractalTrendResult {
        if bars.len() < FRACTAL_WINDOW {
            tracing::debug!(bars = bars.len(), "not enough bars for enhanced fractal trend");
            return EnhancedFractalTrendResult {
                trend: TrendLabel::InsufficientData,
                confidence: 0.0,
                pattern: "Insufficient data for fractal analysis".to_string(),
                recent: RecentSwings::default(),
                trend_strength: 0.0,
                time_decay: 1.0,
                analysis: format!(
                    "Need at least {} candles for fractal analysis, got {}",
                    FRACTAL_WINDOW,
                    bars.len()
                ),
                recommendations: vec![
                    "Wait for more price data to perform fractal trend analysis".to_string()
                ],
                detail: EnhancedDetail::default(),
            };
        }

        let swings = self.detector().detect(bars);
        let detail = EnhancedDetail::from_swings(&swings);
        let recent = detail.recent();
        let (n_highs, n_lows) = (detail.high_sequence.len(), detail.low_sequence.len());

        if n_highs < self.min_fractals || n_lows < self.min_fractals {
            tracing::debug!(
                highs = n_highs,
                lows = n_lows,
                min = self.min_fractals,
                "not enough swings for enhanced fractal trend"
            );
            return EnhancedFractalTrendResult {
                trend: TrendLabel::InsufficientData,
                confidence: 0.0,
                pattern: "Insufficient fractals for enhanced analysis".to_string(),
                recent,
                trend_strength: 0.0,
                time_decay: 1.0,
                analysis: format!(
                    "Need at least {} highs and {} lows for comprehensive analysis. Found {} highs, {} lows",
                    self.min_fractals, self.min_fractals, n_highs, n_lows
                ),
                recommendations: vec![
                    "Wait for more swing points to form before enhanced trend analysis".to_string(),
                ],
                detail,
            };
        }

        let p = detail.overall;
        let strength = p.pattern_strength;
        let consistent = p.trend_consistency > STRONG_CONSISTENCY;

        let (trend, pattern, confidence) = if p.is_higher_high && p.is_higher_low && consistent {
            (
                TrendLabel::Uptrend,
                format!(
                    "Strong Uptrend - All {} highs and {} lows showing ascending pattern",
                    n_highs, n_lows
                ),
                strong_confidence(strength),
            )
        } else if (p.is_higher_high && !p.is_lower_low) || (p.is_higher_low && !p.is_lower_high) {
            let (name, stats) = if p.is_higher_high {
                ("highs", &detail.high_stats)
            } else {
                ("lows", &detail.low_stats)
            };
            (
                TrendLabel::Uptrend,
                format!(
                    "Moderate Uptrend - {} showing {:.1}% ascending moves",
                    name,
                    stats.move_share(SequenceTrend::Ascending)
                ),
                moderate_confidence(strength),
            )
        } else if p.is_lower_high && p.is_lower_low && consistent {
            (
                TrendLabel::Downtrend,
                format!(
                    "Strong Downtrend - All {} highs and {} lows showing descending pattern",
                    n_highs, n_lows
                ),
                strong_confidence(strength),
            )
        } else if (p.is_lower_high && !p.is_higher_low) || (p.is_lower_low && !p.is_higher_high) {
            let (name, stats) = if p.is_lower_high {
                ("highs", &detail.high_stats)
            } else {
                ("lows", &detail.low_stats)
            };
            (
                TrendLabel::Downtrend,
                format!(
                    "Moderate Downtrend - {} showing {:.1}% descending moves",
                    name,
                    stats.move_share(SequenceTrend::Descending)
                ),
                moderate_confidence(strength),
            )
        } else {
            (
                TrendLabel::Sideways,
                format!(
                    "Sideways - Mixed signals across {} highs and {} lows",
                    n_highs, n_lows
                ),
                sideways_confidence(strength),
            )
        };

        let decay = match (self.use_time_decay, recent.last_high, recent.previous_high) {
            (true, Some(last), Some(prev)) => time_decay(&last, &prev),
            _ => 1.0,
        };
        let confidence = clamp_unit(confidence * decay);

        let hs = &detail.high_stats;
        let ls = &detail.low_stats;
        let analysis = format!(
            "Enhanced Fractal Trend Analysis (ALL {} fractals):\n\
             - High Sequence: {} ascending, {} descending moves ({} total highs)\n\
             - Low Sequence: {} ascending, {} descending moves ({} total lows)\n\
             - High Trend: {} ({:.1}% strength, {:.1}% consistency)\n\
             - Low Trend: {} ({:.1}% strength, {:.1}% consistency)\n\
             - Trend Consistency: {:.1}%\n\
             - Max Consecutive: {} moves\n\
             - Average Move Size: {:.3}%\n\
             - Overall Pattern: {}\n\
             - Confidence: {:.1}%",
            swings.len(),
            hs.move_count.ascending,
            hs.move_count.descending,
            n_highs,
            ls.move_count.ascending,
            ls.move_count.descending,
            n_lows,
            hs.overall_trend,
            hs.trend_strength,
            hs.consistency,
            ls.overall_trend,
            ls.trend_strength,
            ls.consistency,
            p.trend_consistency,
            detail.max_consecutive(),
            (hs.average_move + ls.average_move) / 2.0,
            pattern,
            confidence * 100.0
        );

        let mut recommendations = vec![
            format!(
                "Analysis based on {} total fractals ({} highs, {} lows)",
                swings.len(),
                n_highs,
                n_lows
            ),
            format!(
                "High sequence: {} up moves vs {} down moves",
                hs.move_count.ascending, hs.move_count.descending
            ),
            format!(
                "Low sequence: {} up moves vs {} down moves",
                ls.move_count.ascending, ls.move_count.descending
            ),
            format!(
                "Trend consistency: {:.1}% (higher = more reliable)",
                p.trend_consistency
            ),
            format!("Max consecutive moves: {}", detail.max_consecutive()),
        ];
        let threshold = self.confidence_threshold.get();
        if confidence < threshold {
            recommendations.push(format!(
                "Confidence {:.1}% is below the {:.1}% threshold - wait for confirmation",
                confidence * 100.0,
                threshold * 100.0
            ));
        }
        recommendations.push("Enhanced analysis considers ALL fractal movements, not just recent ones".to_string());
        recommendations.push("This provides a more comprehensive view of market structure evolution".to_string());

        EnhancedFractalTrendResult {
            trend,
            confidence,
            pattern,
            recent,
            trend_strength: clamp_unit(strength / 100.0),
            time_decay: decay,
            analysis,
            recommendations,
            detail,
        }
    }
}

/// Classify with the default enhanced configuration
pub fn classify_enhanced<T: OHLC>(bars: &[T]) -> EnhancedFractalTrendResult {
    EnhancedFractalTrendClassifier::default().classify(bars)
}

impl Analyzer for EnhancedFractalTrendClassifier {
    type Output = EnhancedFractalTrendResult;

    fn name(&self) -> &'static str {
        "ENHANCED_FRACTAL_TREND"
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
        Analyzer::validate_config(&self.detector()).map_err(|_| AnalysisError::OutOfRange {
            field: "strength_threshold",
            value: self.strength_threshold,
            min: 0.0,
            max: SWING_STRENGTH_CAP,
        })
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static ENHANCED_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "min_fractals",
        param_type: ParamType::Count,
        default: 3.0,
        range: (2.0, 8.0, 1.0),
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
    ParamMeta {
        name: "strength_threshold",
        param_type: ParamType::Level,
        default: 0.0,
        range: (0.0, 10.0, 0.5),
        description: "Minimum swing strength kept by the detector",
    },
];

impl ParameterizedAnalyzer for EnhancedFractalTrendClassifier {
    fn param_meta() -> &'static [ParamMeta] {
        ENHANCED_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_fractals: get_count(params, "min_fractals", 3)?,
            use_time_decay: get_flag(params, "use_time_decay", true),
            confidence_threshold: get_ratio(params, "confidence_threshold", 0.6)?,
            strength_threshold: get_level(
                params,
                "strength_threshold",
                0.0,
                (0.0, SWING_STRENGTH_CAP),
            )?,
        })
    }

    fn analyzer_name() -> &'static str {
        "ENHANCED_FRACTAL_TREND"
    }
}
