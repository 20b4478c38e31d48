//! # swingtrend - fractal swing points and trend classification
//!
//! Pure, deterministic technical-analysis routines over OHLC candle data:
//! Bill Williams' 5-bar fractal detection, a moving-average trend classifier,
//! and two fractal-structure trend classifiers (latest-pair and full-sequence).
//!
//! ## Quick Start
//!
//! ```rust
//! use swingtrend::prelude::*;
//!
//! // Define your OHLC data
//! struct Bar { o: f64, h: f64, l: f64, c: f64 }
//!
//! impl OHLC for Bar {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//! }
//!
//! // Create engine with default analyzers
//! let engine = EngineBuilder::new().build().unwrap();
//!
//! // Analyze your data
//! let bars: Vec<Bar> = vec![];
//! let report = engine.analyze(&bars).unwrap();
//! assert_eq!(report.fractal_trend.trend, TrendLabel::InsufficientData);
//! ```

pub mod analyzers;
pub mod params;

pub mod prelude {
    pub use crate::{
        // Analyzers
        analyzers::*,
        // Parameters
        params::{
            get_count, get_flag, get_level, get_period, get_ratio, ParamMeta, ParamType,
            ParameterizedAnalyzer,
        },
        // Parallel
        analyze_parallel,
        // Errors
        AnalysisError,
        // Engine
        AnalysisEngine,
        // Core traits
        Analyzer,
        Candle,
        EngineBuilder,
        InstrumentError,
        InstrumentReport,
        MarketReport,
        OHLCExt,
        Period,
        PriceSource,
        Ratio,
        RecentSwings,
        Result,
        SequenceTrend,
        // Types
        SwingKind,
        SwingPoint,
        TrendLabel,
        OHLC,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during analysis
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} candles, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid OHLC at index {index}: {reason}")]
    InvalidOHLC { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core OHLC data trait
pub trait OHLC {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    /// Bar time as unix milliseconds, if known. Drives time decay.
    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Which price of a bar stands in for "the" price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PriceSource {
    #[default]
    Close,
    /// `(open + close) / 2`
    BodyCenter,
}

/// Extension trait with computed properties for OHLC data
pub trait OHLCExt: OHLC {
    #[inline]
    fn body_center(&self) -> f64 {
        (self.open() + self.close()) / 2.0
    }

    #[inline]
    fn price(&self, source: PriceSource) -> f64 {
        match source {
            PriceSource::Close => self.close(),
            PriceSource::BodyCenter => self.body_center(),
        }
    }

    /// Validate OHLC data consistency
    fn validate(&self) -> Result<()> {
        if self.open().is_nan() || self.high().is_nan() || self.low().is_nan() || self.close().is_nan()
        {
            return Err(AnalysisError::InvalidOHLC {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(AnalysisError::InvalidOHLC {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        if self.high() < self.low() {
            return Err(AnalysisError::InvalidOHLC {
                index: 0,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: OHLC> OHLCExt for T {}

/// Plain candle record, for callers without their own bar type
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp: None,
            open,
            high,
            low,
            close,
        }
    }

    /// Same candle stamped with a unix-millisecond time
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl OHLC for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

// ============================================================
// SWING POINTS
// ============================================================

/// Side of a fractal swing point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

/// Local extremum found by the 5-bar fractal window
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SwingPoint {
    pub kind: SwingKind,
    /// Position in the source candle slice
    pub index: usize,
    pub price: f64,
    pub timestamp: Option<i64>,
    /// Relative deviation from the neighbor mean, 0.0..=10.0
    pub strength: f64,
}

impl SwingPoint {
    #[inline]
    pub fn is_high(&self) -> bool {
        self.kind == SwingKind::High
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self.kind == SwingKind::Low
    }
}

/// The two most recent swing points of each kind
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct RecentSwings {
    pub last_high: Option<SwingPoint>,
    pub previous_high: Option<SwingPoint>,
    pub last_low: Option<SwingPoint>,
    pub previous_low: Option<SwingPoint>,
}

impl RecentSwings {
    /// Pick the tail of index-ordered high and low sequences
    pub fn from_sequences(highs: &[SwingPoint], lows: &[SwingPoint]) -> Self {
        let nth_back = |seq: &[SwingPoint], n: usize| seq.iter().rev().nth(n).copied();
        Self {
            last_high: nth_back(highs, 0),
            previous_high: nth_back(highs, 1),
            last_low: nth_back(lows, 0),
            previous_low: nth_back(lows, 1),
        }
    }
}

// ============================================================
// TREND LABELS
// ============================================================

/// Trend classification reported by every classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendLabel {
    Uptrend,
    Downtrend,
    #[default]
    Sideways,
    InsufficientData,
}

impl TrendLabel {
    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, TrendLabel::Uptrend)
    }

    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, TrendLabel::Downtrend)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrendLabel::Uptrend => "UPTREND",
            TrendLabel::Downtrend => "DOWNTREND",
            TrendLabel::Sideways => "SIDEWAYS",
            TrendLabel::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a run of same-kind swing points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceTrend {
    Ascending,
    Descending,
    #[default]
    Sideways,
}

impl SequenceTrend {
    pub fn as_str(self) -> &'static str {
        match self {
            SequenceTrend::Ascending => "ascending",
            SequenceTrend::Descending => "descending",
            SequenceTrend::Sideways => "sideways",
        }
    }
}

impl std::fmt::Display for SequenceTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// ANALYZER TRAIT
// ============================================================

/// Common surface of every analysis component.
///
/// The analyzer value carries its own configuration; `analyze` is a pure
/// function of that configuration and the bars.
pub trait Analyzer: Send + Sync {
    type Output;

    fn name(&self) -> &'static str;

    /// Fewest bars for which `analyze` can produce a real classification
    fn min_bars(&self) -> usize;

    fn analyze<T: OHLC>(&self, bars: &[T]) -> Self::Output;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// ANALYSIS ENGINE
// ============================================================

use analyzers::*;

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub validate_data: bool,
}

/// Everything the engine computes for one candle series
#[derive(Debug, Clone, serde::Serialize)]
pub struct MarketReport {
    pub bar_count: usize,
    pub swings: Vec<SwingPoint>,
    /// `None` with fewer than 5 bars
    pub fractal_summary: Option<FractalSummary>,
    /// `None` when there are fewer bars than the moving-average period
    pub moving_average: Option<TrendResult>,
    pub fractal_trend: FractalTrendResult,
    pub enhanced_trend: EnhancedFractalTrendResult,
}

/// Runs all analyzers over a candle series
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    detector: FractalDetector,
    moving_average: MovingAverageClassifier,
    fractal_trend: FractalTrendClassifier,
    enhanced: EnhancedFractalTrendClassifier,
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn detector(&self) -> &FractalDetector {
        &self.detector
    }

    pub fn moving_average(&self) -> &MovingAverageClassifier {
        &self.moving_average
    }

    pub fn fractal_trend(&self) -> &FractalTrendClassifier {
        &self.fractal_trend
    }

    pub fn enhanced(&self) -> &EnhancedFractalTrendClassifier {
        &self.enhanced
    }

    /// Run every analyzer and collect the results.
    ///
    /// Only data validation (when enabled) makes this fail; too-short input
    /// degrades per analyzer.
    pub fn analyze<T: OHLC>(&self, bars: &[T]) -> Result<MarketReport> {
        if self.config.validate_data {
            self.validate_bars(bars)?;
        }

        let swings = self.detector.detect(bars);

        let fractal_summary = match self.detector.summarize(bars) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::debug!("Skipping fractal summary: {}", e);
                None
            }
        };

        let moving_average = match self.moving_average.classify(bars) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::debug!("Skipping moving-average trend: {}", e);
                None
            }
        };

        Ok(MarketReport {
            bar_count: bars.len(),
            swings,
            fractal_summary,
            moving_average,
            fractal_trend: self.fractal_trend.classify(bars),
            enhanced_trend: self.enhanced.classify(bars),
        })
    }

    fn validate_bars<T: OHLC>(&self, bars: &[T]) -> Result<()> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                AnalysisError::InvalidOHLC { reason, .. } => {
                    AnalysisError::InvalidOHLC { index: i, reason }
                }
                other => other,
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        Analyzer::validate_config(&self.detector)?;
        Analyzer::validate_config(&self.moving_average)?;
        Analyzer::validate_config(&self.fractal_trend)?;
        Analyzer::validate_config(&self.enhanced)?;
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating AnalysisEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    detector: FractalDetector,
    moving_average: MovingAverageClassifier,
    fractal_trend: FractalTrendClassifier,
    enhanced: EnhancedFractalTrendClassifier,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector used for the report's swing list and fractal summary
    pub fn detector(mut self, detector: FractalDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn moving_average(mut self, classifier: MovingAverageClassifier) -> Self {
        self.moving_average = classifier;
        self
    }

    pub fn fractal_trend(mut self, classifier: FractalTrendClassifier) -> Self {
        self.fractal_trend = classifier;
        self
    }

    pub fn enhanced(mut self, classifier: EnhancedFractalTrendClassifier) -> Self {
        self.enhanced = classifier;
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<AnalysisEngine> {
        let engine = AnalysisEngine {
            detector: self.detector,
            moving_average: self.moving_average,
            fractal_trend: self.fractal_trend,
            enhanced: self.enhanced,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Result of analyzing a single instrument
#[derive(Debug)]
pub struct InstrumentReport {
    pub symbol: String,
    pub report: MarketReport,
}

/// Error from analyzing a single instrument
#[derive(Debug)]
pub struct InstrumentError {
    pub symbol: String,
    pub error: AnalysisError,
}

/// Parallel analysis of multiple instruments
pub fn analyze_parallel<'a, T, I>(
    engine: &AnalysisEngine,
    instruments: I,
) -> (Vec<InstrumentReport>, Vec<InstrumentError>)
where
    T: OHLC + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .analyze(bars)
                .map(|report| InstrumentReport {
                    symbol: symbol.to_string(),
                    report,
                })
                .map_err(|error| {
                    tracing::warn!("Analysis of {} failed: {}", symbol, error);
                    InstrumentError {
                        symbol: symbol.to_string(),
                        error,
                    }
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_uptrend_bars() -> Vec<Candle> {
        (0..30)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                Candle::new(base, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect()
    }

    fn make_downtrend_bars() -> Vec<Candle> {
        (0..30)
            .map(|i| {
                let base = 100.0 - i as f64 * 2.0;
                Candle::new(base, base + 1.0, base - 1.0, base - 0.5)
            })
            .collect()
    }

    #[test]
    fn test_ratio_validation() {
        assert!(Ratio::new(0.0).is_ok());
        assert!(Ratio::new(1.0).is_ok());
        assert!(Ratio::new(0.55).is_ok());
        assert!(Ratio::new(-0.1).is_err());
        assert!(Ratio::new(1.1).is_err());
        assert!(Ratio::new(f64::NAN).is_err());
        assert!(Ratio::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(20).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_price_source() {
        let bar = Candle::new(100.0, 110.0, 90.0, 104.0);
        assert_eq!(bar.price(PriceSource::Close), 104.0);
        assert_eq!(bar.price(PriceSource::BodyCenter), 102.0);
    }

    #[test]
    fn test_ohlc_validate() {
        assert!(Candle::new(1.0, 2.0, 0.5, 1.5).validate().is_ok());
        assert!(Candle::new(1.0, 0.5, 2.0, 1.5).validate().is_err());
        assert!(Candle::new(f64::NAN, 2.0, 0.5, 1.5).validate().is_err());
        assert!(Candle::new(1.0, f64::INFINITY, 0.5, 1.5).validate().is_err());
    }

    #[test]
    fn test_recent_swings_from_sequences() {
        let point = |kind, index, price| SwingPoint {
            kind,
            index,
            price,
            timestamp: None,
            strength: 1.0,
        };
        let highs = vec![point(SwingKind::High, 2, 10.0), point(SwingKind::High, 6, 12.0)];
        let lows = vec![point(SwingKind::Low, 4, 8.0)];

        let recent = RecentSwings::from_sequences(&highs, &lows);
        assert_eq!(recent.last_high.map(|s| s.index), Some(6));
        assert_eq!(recent.previous_high.map(|s| s.index), Some(2));
        assert_eq!(recent.last_low.map(|s| s.index), Some(4));
        assert!(recent.previous_low.is_none());
    }

    #[test]
    fn test_trend_label_display() {
        assert_eq!(TrendLabel::Uptrend.to_string(), "UPTREND");
        assert_eq!(TrendLabel::InsufficientData.to_string(), "INSUFFICIENT_DATA");
        assert_eq!(SequenceTrend::Descending.to_string(), "descending");
    }

    #[test]
    fn test_engine_builder() {
        let engine = EngineBuilder::new().build();
        assert!(engine.is_ok());
    }

    #[test]
    fn test_engine_rejects_bad_threshold() {
        let classifier = MovingAverageClassifier {
            threshold: Ratio::new_const(1.0),
            ..Default::default()
        };
        let engine = EngineBuilder::new().moving_average(classifier).build();
        assert!(engine.is_err());
    }

    #[test]
    fn test_empty_analyze() {
        let engine = EngineBuilder::new().build().unwrap();
        let bars: Vec<Candle> = vec![];
        let report = engine.analyze(&bars).unwrap();
        assert_eq!(report.bar_count, 0);
        assert!(report.swings.is_empty());
        assert!(report.fractal_summary.is_none());
        assert!(report.moving_average.is_none());
        assert_eq!(report.fractal_trend.trend, TrendLabel::InsufficientData);
        assert_eq!(report.enhanced_trend.trend, TrendLabel::InsufficientData);
    }

    #[test]
    fn test_analyze_uptrend() {
        let engine = EngineBuilder::new().build().unwrap();
        let report = engine.analyze(&make_uptrend_bars()).unwrap();
        let ma = report.moving_average.unwrap();
        assert_eq!(ma.trend, TrendLabel::Uptrend);
        assert!(report.fractal_summary.is_some());
    }

    #[test]
    fn test_validate_data_reports_index() {
        let engine = EngineBuilder::new().validate_data(true).build().unwrap();
        let mut bars = make_uptrend_bars();
        bars[7] = Candle::new(100.0, 90.0, 110.0, 100.0);

        match engine.analyze(&bars) {
            Err(AnalysisError::InvalidOHLC { index, .. }) => assert_eq!(index, 7),
            other => panic!("expected InvalidOHLC, got {:?}", other),
        }
    }

    #[test]
    fn test_parallel_analyze() {
        let engine = EngineBuilder::new().validate_data(true).build().unwrap();

        let bars1 = make_downtrend_bars();
        let bars2 = make_uptrend_bars();
        let mut bars3 = make_uptrend_bars();
        bars3[0].close = f64::NAN;

        let instruments: Vec<(&str, &[Candle])> =
            vec![("EUR_USD", &bars1), ("GBP_USD", &bars2), ("USD_JPY", &bars3)];

        let (results, errors) = analyze_parallel(&engine, instruments);
        assert_eq!(results.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].symbol, "USD_JPY");
    }
}
