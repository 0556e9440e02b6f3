//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2/(length+1).
//! Seed: EMA[0] = x[0]. Defined from the first bar, so lookback is 0.
//! A NaN input taints every later value.

use super::{closes, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        ema(&closes(bars), self.period)
    }
}

/// EMA of an arbitrary series.
pub fn ema(values: &[f64], length: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n == 0 || length == 0 {
        return result;
    }

    let alpha = 2.0 / (length as f64 + 1.0);
    let mut prev = f64::NAN;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return result;
        }
        let value = if i == 0 {
            v
        } else {
            alpha * v + (1.0 - alpha) * prev
        };
        result[i] = value;
        prev = value;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_close() {
        let result = ema(&[100.0, 200.0, 300.0], 1);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5
        // EMA[0] = 10
        // EMA[1] = 0.5*11 + 0.5*10 = 10.5
        // EMA[2] = 0.5*12 + 0.5*10.5 = 11.25
        let result = ema(&[10.0, 11.0, 12.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_defined_before_length_bars() {
        let result = ema(&[5.0, 6.0], 20);
        assert!(result.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn ema_constant_series_is_fixed_point() {
        let result = ema(&[42.5; 30], 20);
        for v in result {
            assert_approx(v, 42.5, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn ema_nan_propagates() {
        let result = ema(&[10.0, 11.0, f64::NAN, 13.0], 3);
        assert!(result[0].is_finite());
        assert!(result[1].is_finite());
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn ema_zero_length_is_undefined() {
        assert!(ema(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_indicator_matches_series_fn() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let indicator = Ema::new(3);
        assert_eq!(indicator.name(), "ema_3");
        assert_eq!(indicator.lookback(), 0);
        let expected = ema(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0], 3);
        for (a, b) in indicator.compute(&bars).iter().zip(expected) {
            assert_approx(*a, b, DEFAULT_EPSILON);
        }
    }
}
