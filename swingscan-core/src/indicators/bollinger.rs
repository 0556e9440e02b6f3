//! Bollinger band position.
//!
//! BandPos = (close - lower) / (upper - lower), where
//! upper/lower = SMA(close, period) ± mult · stdev(close, period).
//! Sample stdev (n-1). Values outside [0, 1] mean price is outside the bands.
//! Zero band width is undefined (NaN).
//! Lookback: period - 1.

use super::{closes, rolling_mean, rolling_std, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct BandPosition {
    period: usize,
    multiplier: f64,
    name: String,
}

impl BandPosition {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 2, "band position period must be >= 2");
        Self {
            period,
            multiplier,
            name: format!("bandpos_{period}"),
        }
    }
}

impl Indicator for BandPosition {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes = closes(bars);
        let middle = rolling_mean(&closes, self.period);
        let stdev = rolling_std(&closes, self.period);

        closes
            .iter()
            .zip(middle.iter().zip(&stdev))
            .map(|(&close, (&mid, &sd))| {
                let lower = mid - self.multiplier * sd;
                let width = 2.0 * self.multiplier * sd;
                if width > 0.0 && close.is_finite() {
                    (close - lower) / width
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bandpos_close_at_mean_is_half() {
        // Symmetric window around 11: mean 11, close 11
        let bars = make_bars(&[10.0, 12.0, 11.0]);
        let result = BandPosition::new(3, 2.0).compute(&bars);
        assert_approx(result[2], 0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn bandpos_known_value() {
        // closes 1,2,3: mean 2, sample sd 1, bands 0..4, close 3 → 0.75
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let result = BandPosition::new(3, 2.0).compute(&bars);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 0.75, DEFAULT_EPSILON);
    }

    #[test]
    fn bandpos_flat_series_is_undefined() {
        let bars = make_bars(&[100.0; 25]);
        let result = BandPosition::new(20, 2.0).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn bandpos_can_exceed_one() {
        let mut closes = vec![100.0; 19];
        closes[0] = 99.0;
        closes.push(130.0);
        let bars = make_bars(&closes);
        let result = BandPosition::new(20, 2.0).compute(&bars);
        assert!(result[19] > 1.0, "got {}", result[19]);
    }
}
