//! Moving-average trend classification
//!
//! Every bar from `period - 1` onward is compared with the trailing SMA ending
//! on it. The share of bars above (below) the average decides the trend.

use std::collections::HashMap;

use super::helpers::{clamp_unit, sma};
use crate::params::{get_flag, get_period, get_ratio, ParamMeta, ParamType, ParameterizedAnalyzer};
use crate::{
    AnalysisError, Analyzer, OHLCExt, Period, PriceSource, Ratio, Result, TrendLabel, OHLC,
};

/// Price vs. simple moving average trend classifier
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MovingAverageClassifier {
    pub period: Period,
    /// Compare closes; otherwise body centers `(open + close) / 2`
    pub use_close_price: bool,
    /// Strength from mean deviation magnitude instead of the winning share
    pub weighted: bool,
    /// Share of bars a side needs to call a trend, exclusive (0, 1)
    pub threshold: Ratio,
}

impl Default for MovingAverageClassifier {
    fn default() -> Self {
        Self {
            period: Period::new_const(20),
            use_close_price: true,
            weighted: true,
            threshold: Ratio::new_const(0.55),
        }
    }
}

/// Outcome of the moving-average classifier
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TrendResult {
    pub trend: TrendLabel,
    /// 0.0..=1.0
    pub confidence: f64,
    /// 0.0..=1.0
    pub trend_strength: f64,
    pub uptrend_count: usize,
    pub downtrend_count: usize,
    pub analyzed_count: usize,
    pub uptrend_percentage: f64,
    pub downtrend_percentage: f64,
    /// Proxy price of the last bar
    pub current_price: f64,
    /// Last SMA value
    pub ma_value: f64,
    /// SMA series, aligned with bars `period - 1..`
    pub moving_average: Vec<f64>,
    pub analysis: String,
}

impl TrendResult {
    /// Bars exactly on their moving average
    pub fn neutral_count(&self) -> usize {
        self.analyzed_count - self.uptrend_count - self.downtrend_count
    }

    /// Direction- and confidence-tier advice followed by risk boilerplate
    pub fn recommendations(&self) -> Vec<String> {
        let mut recs: Vec<&str> = Vec::new();

        match self.trend {
            TrendLabel::Uptrend if self.confidence > 0.7 => {
                recs.push("Strong uptrend detected - consider long positions");
                recs.push("Look for pullbacks to moving average as entry opportunities");
            }
            TrendLabel::Uptrend => {
                recs.push("Moderate uptrend - consider long positions with caution");
                recs.push("Monitor for trend reversal signals");
            }
            TrendLabel::Downtrend if self.confidence > 0.7 => {
                recs.push("Strong downtrend detected - consider short positions");
                recs.push("Look for bounces to moving average as entry opportunities");
            }
            TrendLabel::Downtrend => {
                recs.push("Moderate downtrend - consider short positions with caution");
                recs.push("Monitor for trend reversal signals");
            }
            TrendLabel::Sideways => {
                recs.push("Market is consolidating - avoid trend-following strategies");
                recs.push("Look for breakout signals above or below key levels");
                recs.push("Consider range-bound trading strategies");
            }
            TrendLabel::InsufficientData => {}
        }

        recs.push("Always use proper risk management and stop-loss orders");
        recs.push("Consider market volatility and news events");
        recs.into_iter().map(String::from).collect()
    }
}

impl MovingAverageClassifier {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    #[inline]
    pub fn price_source(&self) -> PriceSource {
        if self.use_close_price {
            PriceSource::Close
        } else {
            PriceSource::BodyCenter
        }
    }

    /// Classify the series.
    ///
    /// Fails with [`AnalysisError::InsufficientData`] when there are fewer
    /// bars than the period (an empty series always fails).
    pub fn classify<T: OHLC>(&self, bars: &[T]) -> Result<TrendResult> {
        let period = self.period.get();
        if bars.is_empty() || bars.len() < period {
            tracing::debug!(period, bars = bars.len(), "not enough bars for moving average");
            return Err(AnalysisError::InsufficientData {
                need: period,
                got: bars.len(),
            });
        }

        let source = self.price_source();
        let prices: Vec<f64> = bars.iter().map(|b| b.price(source)).collect();
        let moving_average = sma(&prices, period);
        let aligned = &prices[period - 1..];

        let mut uptrend_count = 0usize;
        let mut downtrend_count = 0usize;
        let mut up_deviation = 0.0;
        let mut down_deviation = 0.0;

        for (&price, &ma) in aligned.iter().zip(&moving_average) {
            if price > ma {
                uptrend_count += 1;
                if self.weighted {
                    up_deviation += relative_deviation(price, ma);
                }
            } else if price < ma {
                downtrend_count += 1;
                if self.weighted {
                    down_deviation += relative_deviation(price, ma);
                }
            }
        }

        let analyzed_count = moving_average.len();
        let total = analyzed_count as f64;
        let up_pct = uptrend_count as f64 / total;
        let down_pct = downtrend_count as f64 / total;
        let threshold = self.threshold.get();

        let (trend, confidence, strength) = if up_pct > threshold {
            let strength = if self.weighted && uptrend_count > 0 {
                (up_deviation / uptrend_count as f64).min(1.0)
            } else {
                up_pct
            };
            (TrendLabel::Uptrend, up_pct, strength)
        } else if down_pct > threshold {
            let strength = if self.weighted && downtrend_count > 0 {
                (down_deviation / downtrend_count as f64).min(1.0)
            } else {
                down_pct
            };
            (TrendLabel::Downtrend, down_pct, strength)
        } else {
            (
                TrendLabel::Sideways,
                up_pct.max(down_pct),
                1.0 - (up_pct - down_pct).abs(),
            )
        };
        let confidence = clamp_unit(confidence);
        let trend_strength = clamp_unit(strength);

        tracing::trace!(
            uptrend_count,
            downtrend_count,
            analyzed_count,
            trend = trend.as_str(),
            "moving-average tally"
        );

        let price_type = if self.use_close_price { "close price" } else { "body center" };
        let method = if self.weighted { "magnitude-weighted" } else { "simple counting" };
        let analysis = format!(
            "Market trend analysis using {}-period moving average:\n\
             - Analyzed {} candles using {}\n\
             - {} method applied\n\
             - {} uptrend signals ({:.1}%)\n\
             - {} downtrend signals ({:.1}%)\n\
             - Overall trend: {} with {:.1}% confidence\n\
             - Trend strength: {:.1}%",
            period,
            analyzed_count,
            price_type,
            method,
            uptrend_count,
            up_pct * 100.0,
            downtrend_count,
            down_pct * 100.0,
            trend,
            confidence * 100.0,
            trend_strength * 100.0
        );

        Ok(TrendResult {
            trend,
            confidence,
            trend_strength,
            uptrend_count,
            downtrend_count,
            analyzed_count,
            uptrend_percentage: up_pct,
            downtrend_percentage: down_pct,
            current_price: prices.last().copied().unwrap_or_default(),
            ma_value: moving_average.last().copied().unwrap_or_default(),
            moving_average,
            analysis,
        })
    }
}

/// `|price - ma| / ma`, 0.0 for a zero average
#[inline]
fn relative_deviation(price: f64, ma: f64) -> f64 {
    if ma.abs() <= f64::EPSILON {
        return 0.0;
    }
    let deviation = ((price - ma) / ma).abs();
    if deviation.is_finite() {
        deviation
    } else {
        0.0
    }
}

impl Analyzer for MovingAverageClassifier {
    type Output = Result<TrendResult>;

    fn name(&self) -> &'static str {
        "MA_TREND"
    }

    fn min_bars(&self) -> usize {
        self.period.get()
    }

    fn analyze<T: OHLC>(&self, bars: &[T]) -> Self::Output {
        self.classify(bars)
    }

    fn validate_config(&self) -> Result<()> {
        let t = self.threshold.get();
        if t <= 0.0 || t >= 1.0 {
            return Err(AnalysisError::OutOfRange {
                field: "threshold",
                value: t,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static MA_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "period",
        param_type: ParamType::Period,
        default: 20.0,
        range: (5.0, 50.0, 5.0),
        description: "Moving average lookback",
    },
    ParamMeta {
        name: "use_close_price",
        param_type: ParamType::Flag,
        default: 1.0,
        range: (0.0, 1.0, 1.0),
        description: "Compare closes (1) or body centers (0)",
    },
    ParamMeta {
        name: "weighted",
        param_type: ParamType::Flag,
        default: 1.0,
        range: (0.0, 1.0, 1.0),
        description: "Strength from mean deviation magnitude",
    },
    ParamMeta {
        name: "threshold",
        param_type: ParamType::Ratio,
        default: 0.55,
        range: (0.5, 0.8, 0.05),
        description: "Share of bars one side needs to call a trend",
    },
];

impl ParameterizedAnalyzer for MovingAverageClassifier {
    fn param_meta() -> &'static [ParamMeta] {
        MA_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let classifier = Self {
            period: get_period(params, "period", 20)?,
            use_close_price: get_flag(params, "use_close_price", true),
            weighted: get_flag(params, "weighted", true),
            threshold: get_ratio(params, "threshold", 0.55)?,
        };
        classifier.validate_config()?;
        Ok(classifier)
    }

    fn analyzer_name() -> &'static str {
        "MA_TREND"
    }
}
