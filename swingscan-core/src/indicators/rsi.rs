//! Relative Strength Index (RSI).
//!
//! Wilder smoothing (alpha = 1/length) of gains and losses, seeded with the
//! first bar-to-bar change. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//!
//! Edge cases:
//! - indices before `length` hold the neutral placeholder 50
//! - avg_loss == 0 with any gain → 100
//! - no movement at all (both averages 0) → 50
//! - output clamped to [0, 100]
//! - a NaN close makes that bar and every later one NaN

use super::{closes, Indicator};
use crate::domain::PriceBar;

/// Placeholder for bars without enough history, and for flat series.
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    /// Leading values are placeholders (50), not NaN.
    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rsi(&closes(bars), self.period)
    }
}

/// RSI of an arbitrary series.
pub fn rsi(values: &[f64], length: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n == 0 || length == 0 {
        return result;
    }

    let alpha = 1.0 / length as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 0..n {
        if values[i].is_nan() {
            return result;
        }
        if i > 0 {
            let change = values[i] - values[i - 1];
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);
            if i == 1 {
                avg_gain = gain;
                avg_loss = loss;
            } else {
                avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
                avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            }
        }
        result[i] = if i < length {
            NEUTRAL_RSI
        } else {
            compute_rsi(avg_gain, avg_loss)
        };
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        return NEUTRAL_RSI;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }
    if avg_gain == 0.0 {
        return 0.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&closes, 14);
        assert_eq!(result[19], 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let result = rsi(&closes, 14);
        assert_eq!(result[19], 0.0);
    }

    #[test]
    fn rsi_flat_series_is_neutral() {
        let result = rsi(&[50.0; 30], 14);
        assert!(result.iter().all(|&v| v == NEUTRAL_RSI));
    }

    #[test]
    fn rsi_warmup_is_placeholder() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&closes, 14);
        for v in &result[..14] {
            assert_eq!(*v, NEUTRAL_RSI);
        }
    }

    #[test]
    fn rsi_known_values() {
        // length 2, alpha 0.5
        // changes: +2, -1
        // i=1: gain 2, loss 0 (seed)
        // i=2: gain 0.5*0 + 0.5*2 = 1, loss 0.5*1 + 0 = 0.5 → rs 2 → 66.666...
        let result = rsi(&[10.0, 12.0, 11.0], 2);
        assert_eq!(result[0], NEUTRAL_RSI);
        assert_eq!(result[1], NEUTRAL_RSI);
        assert_approx(result[2], 200.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_nan_propagates() {
        let result = rsi(&[10.0, 11.0, f64::NAN, 12.0], 2);
        assert_eq!(result[1], NEUTRAL_RSI);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn rsi_stays_in_bounds() {
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        for v in rsi(&closes, 14) {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn rsi_indicator_uses_closes() {
        let bars = make_bars(&[10.0, 12.0, 11.0]);
        let result = Rsi::new(2).compute(&bars);
        assert_approx(result[2], 200.0 / 3.0, DEFAULT_EPSILON);
    }
}
