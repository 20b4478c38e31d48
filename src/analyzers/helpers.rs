//! Common helper functions for swing and trend analysis
//!
//! Thresholds, guarded ratios and confidence tiers shared across all analyzer modules.

use crate::{SequenceTrend, SwingKind, SwingPoint};

// ============================================================
// THRESHOLDS
// ============================================================

/// Bars in a fractal window: the candidate plus two on each side
pub const FRACTAL_WINDOW: usize = 5;
/// Neighbors compared on each side of a fractal candidate
pub const FRACTAL_SIDE: usize = 2;
/// Upper bound of swing point strength
pub const SWING_STRENGTH_CAP: f64 = 10.0;
/// Relative price changes within +/- 0.1% count as neither higher nor lower
pub const NOISE_BAND: f64 = 0.001;
/// e-folding time of the confidence decay, in days
pub const DECAY_SCALE_DAYS: f64 = 30.0;
/// Floor of the confidence decay factor
pub const MIN_DECAY: f64 = 0.1;
pub const MS_PER_DAY: f64 = 86_400_000.0;

// Confidence tiers: base + (strength / 100) * span
pub const STRONG_BASE: f64 = 0.85;
pub const STRONG_SPAN: f64 = 0.15;
pub const MODERATE_BASE: f64 = 0.60;
pub const MODERATE_SPAN: f64 = 0.25;
pub const SIDEWAYS_BASE: f64 = 0.40;
pub const SIDEWAYS_SPAN: f64 = 0.20;

// ============================================================
// GUARDED ARITHMETIC
// ============================================================

/// `(to - from) / from`, or 0.0 when `from` is zero or not finite
#[inline]
pub fn relative_change(from: f64, to: f64) -> f64 {
    if !from.is_finite() || from.abs() <= f64::EPSILON {
        return 0.0;
    }
    let change = (to - from) / from;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

/// Direction of a relative change after applying the noise band
#[inline]
pub fn classify_move(change: f64) -> SequenceTrend {
    if change > NOISE_BAND {
        SequenceTrend::Ascending
    } else if change < -NOISE_BAND {
        SequenceTrend::Descending
    } else {
        SequenceTrend::Sideways
    }
}

/// Trailing simple moving average. One value per full window, so
/// `prices.len() - period + 1` values (empty if the window does not fit).
pub fn sma(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }
    prices
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

// ============================================================
// SWING HELPERS
// ============================================================

/// Split swings into (highs, lows), each ordered by source index
pub fn split_by_kind(swings: &[SwingPoint]) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
    let (mut highs, mut lows): (Vec<SwingPoint>, Vec<SwingPoint>) =
        swings.iter().partition(|s| s.kind == SwingKind::High);
    highs.sort_by_key(|s| s.index);
    lows.sort_by_key(|s| s.index);
    (highs, lows)
}

/// `max(MIN_DECAY, exp(-days / 30))` over the gap between two swing points.
///
/// Without timestamps on both points there is nothing to decay by: 1.0.
/// The gap is taken in floating point, so any pair of `i64` stamps is accepted;
/// a latest point stamped before the previous one never raises the factor above 1.0.
pub fn time_decay(last: &SwingPoint, previous: &SwingPoint) -> f64 {
    match (last.timestamp, previous.timestamp) {
        (Some(t1), Some(t0)) => {
            let days = (t1 as f64 - t0 as f64) / MS_PER_DAY;
            (-days / DECAY_SCALE_DAYS).exp().clamp(MIN_DECAY, 1.0)
        }
        _ => 1.0,
    }
}

#[inline]
pub fn strong_confidence(strength: f64) -> f64 {
    (STRONG_BASE + strength / 100.0 * STRONG_SPAN).min(1.0)
}

#[inline]
pub fn moderate_confidence(strength: f64) -> f64 {
    (MODERATE_BASE + strength / 100.0 * MODERATE_SPAN).min(STRONG_BASE)
}

#[inline]
pub fn sideways_confidence(strength: f64) -> f64 {
    (SIDEWAYS_BASE + strength / 100.0 * SIDEWAYS_SPAN).min(MODERATE_BASE)
}

/// Clamp to [0, 1], mapping NaN to 0
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
