//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), TR[0] = high-low.
//! ATR is the Wilder average (alpha = 1/length) of TR seeded with TR[0].
//! Values before index length-1 are masked as undefined.

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        atr(bars, self.period)
    }
}

/// True Range series.
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; bars.len()];

    for (i, bar) in bars.iter().enumerate() {
        let (h, l) = (bar.high, bar.low);
        if h.is_nan() || l.is_nan() {
            continue;
        }
        if i == 0 {
            tr[i] = h - l;
            continue;
        }
        let pc = bars[i - 1].close;
        if pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }

    tr
}

/// Wilder recursive average seeded with the first value.
pub fn wilder_average(values: &[f64], length: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n == 0 || length == 0 {
        return result;
    }

    let alpha = 1.0 / length as f64;
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

/// ATR over `length` bars.
pub fn atr(bars: &[PriceBar], length: usize) -> Vec<f64> {
    let mut result = wilder_average(&true_range(bars), length);
    let warmup = length.saturating_sub(1).min(result.len());
    for v in result.iter_mut().take(warmup) {
        *v = f64::NAN;
    }
    result
}
