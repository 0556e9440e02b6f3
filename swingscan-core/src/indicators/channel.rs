//! Trailing highest high / lowest low.
//!
//! Lookback: period - 1.

use super::{rolling_max, rolling_min, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct HighestHigh {
    period: usize,
    name: String,
}

impl HighestHigh {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "highest-high period must be >= 1");
        Self {
            period,
            name: format!("hh_{period}"),
        }
    }
}

impl Indicator for HighestHigh {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        rolling_max(&highs, self.period)
    }
}

#[derive(Debug, Clone)]
pub struct LowestLow {
    period: usize,
    name: String,
}

impl LowestLow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "lowest-low period must be >= 1");
        Self {
            period,
            name: format!("ll_{period}"),
        }
    }
}

impl Indicator for LowestLow {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        rolling_min(&lows, self.period)
    }
}
