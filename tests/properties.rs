//! Property tests over generated candle series.

use proptest::prelude::*;
use swingtrend::prelude::{
    detect_fractals, AnalysisError, Candle, EnhancedFractalTrendClassifier,
    FractalTrendClassifier, MovingAverageClassifier, Period, Ratio,
};

/// Candles with high >= max(open, close) and low <= min(open, close)
fn candles(max_len: usize) -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((1.0f64..1000.0, -5.0f64..5.0, 0.0f64..5.0, 0.0f64..5.0), 0..max_len)
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (open, delta, up, down))| {
                    let close = (open + delta).max(0.01);
                    let high = open.max(close) + up;
                    let low = (open.min(close) - down).max(0.0);
                    Candle::new(open, high, low, close).at(i as i64 * 3_600_000)
                })
                .collect()
        })
}

proptest! {
    #[test]
    fn prop_fractals_respect_window(bars in candles(80)) {
        let swings = detect_fractals(&bars);
        if bars.len() < 5 {
            prop_assert!(swings.is_empty());
        }
        for s in &swings {
            prop_assert!(s.index >= 2);
            prop_assert!(s.index + 2 < bars.len());
            prop_assert!((0.0..=10.0).contains(&s.strength));
        }
        prop_assert!(swings.windows(2).all(|w| w[0].index <= w[1].index));
    }

    #[test]
    fn prop_analysis_is_deterministic(bars in candles(60)) {
        let basic = FractalTrendClassifier::default();
        let enhanced = EnhancedFractalTrendClassifier::default();
        prop_assert_eq!(basic.classify(&bars), basic.classify(&bars));
        prop_assert_eq!(enhanced.classify(&bars), enhanced.classify(&bars));
        prop_assert_eq!(detect_fractals(&bars), detect_fractals(&bars));
    }

    #[test]
    fn prop_confidence_is_bounded(bars in candles(60), threshold in 0.01f64..0.99) {
        let ratio = Ratio::new(threshold).unwrap();

        let ma = MovingAverageClassifier {
            threshold: ratio,
            ..MovingAverageClassifier::new(Period::new(5).unwrap())
        };
        if let Ok(result) = ma.classify(&bars) {
            prop_assert!((0.0..=1.0).contains(&result.confidence));
            prop_assert!((0.0..=1.0).contains(&result.trend_strength));
        }

        let basic = FractalTrendClassifier { confidence_threshold: ratio, ..Default::default() };
        let r = basic.classify(&bars);
        prop_assert!((0.0..=1.0).contains(&r.confidence));
        prop_assert!((0.0..=1.0).contains(&r.trend_strength));

        let enhanced = EnhancedFractalTrendClassifier { confidence_threshold: ratio, ..Default::default() };
        let r = enhanced.classify(&bars);
        prop_assert!((0.0..=1.0).contains(&r.confidence));
        prop_assert!((0.0..=1.0).contains(&r.trend_strength));
    }

    #[test]
    fn prop_moving_average_tallies(bars in candles(60), period in 1usize..15) {
        let classifier = MovingAverageClassifier::new(Period::new(period).unwrap());
        match classifier.classify(&bars) {
            Ok(result) => {
                prop_assert_eq!(result.moving_average.len(), bars.len() - period + 1);
                prop_assert_eq!(result.analyzed_count, result.moving_average.len());
                prop_assert!(result.uptrend_count + result.downtrend_count <= result.analyzed_count);
                prop_assert_eq!(
                    result.uptrend_count + result.downtrend_count + result.neutral_count(),
                    result.analyzed_count
                );
                let neutral_pct = result.neutral_count() as f64 / result.analyzed_count as f64;
                let total_pct = result.uptrend_percentage + result.downtrend_percentage + neutral_pct;
                prop_assert!((total_pct - 1.0).abs() < 1e-12);
            }
            Err(AnalysisError::InsufficientData { need, got }) => {
                prop_assert_eq!(need, period);
                prop_assert!(got < period);
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }

    #[test]
    fn prop_sequence_counts_are_consistent(bars in candles(80)) {
        let detail = EnhancedFractalTrendClassifier::default().classify(&bars).detail;
        for (stats, seq) in [
            (&detail.high_stats, &detail.high_sequence),
            (&detail.low_stats, &detail.low_sequence),
        ] {
            prop_assert_eq!(stats.sequence_length, seq.len());
            prop_assert_eq!(stats.move_count.total, stats.move_count.ascending + stats.move_count.descending);
            prop_assert!(stats.move_count.total <= seq.len().saturating_sub(1));
            prop_assert!((0.0..=100.0).contains(&stats.consistency));
            prop_assert!((0.0..=100.0).contains(&stats.trend_strength));
        }
        prop_assert!(detail.high_sequence.iter().all(|s| s.is_high()));
        prop_assert!(detail.low_sequence.iter().all(|s| s.is_low()));
    }
}
