//! Volume averages.
//!
//! AvgVolume = SMA(volume, period).
//! RelVolume = volume / AvgVolume; undefined when the average is zero or undefined.

use super::{rolling_mean, Indicator};
use crate::domain::PriceBar;

fn volumes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}

#[derive(Debug, Clone)]
pub struct AvgVolume {
    period: usize,
    name: String,
}

impl AvgVolume {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "average volume period must be >= 1");
        Self {
            period,
            name: format!("avgvol_{period}"),
        }
    }
}

impl Indicator for AvgVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rolling_mean(&volumes(bars), self.period)
    }
}

#[derive(Debug, Clone)]
pub struct RelVolume {
    period: usize,
    name: String,
}

impl RelVolume {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "relative volume period must be >= 1");
        Self {
            period,
            name: format!("relvol_{period}"),
        }
    }
}

impl Indicator for RelVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let vols = volumes(bars);
        rolling_mean(&vols, self.period)
            .iter()
            .zip(&vols)
            .map(|(&avg, &v)| if avg > 0.0 { v / avg } else { f64::NAN })
            .collect()
    }
}
