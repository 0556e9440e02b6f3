//! Sensitivity levels and their threshold table.
//!
//! Level 1 is the strictest, level 5 the loosest. Each row loosens (or holds)
//! every threshold relative to the row above it, so a confirmed setup at a
//! given level stays confirmed at every higher level.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Trend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sensitivity must be between 1 and 5, got {0}")]
pub struct SensitivityError(pub u8);

/// Scan sensitivity, 1 (strict) ..= 5 (relaxed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Sensitivity(u8);

impl Sensitivity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: u8) -> Result<Self, SensitivityError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(SensitivityError(level))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Every level, strictest first.
    pub fn all() -> impl Iterator<Item = Sensitivity> {
        (Self::MIN..=Self::MAX).map(Sensitivity)
    }

    fn index(self) -> usize {
        usize::from(self.0 - Self::MIN)
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Sensitivity {
    type Error = SensitivityError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Sensitivity> for u8 {
    fn from(s: Sensitivity) -> u8 {
        s.0
    }
}

/// Confirmation thresholds for one sensitivity level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Breakout needs RSI strictly above this.
    pub breakout_rsi: f64,
    /// Breakout needs BandPos strictly above this.
    pub breakout_band: f64,
    /// Pullback needs RSI strictly below this.
    pub pullback_rsi_max: f64,
    /// Pullback needs BandPos at or below this.
    pub pullback_band: f64,
}

/// Threshold shift applied under a broad-market bias.
pub const BIAS_RSI_BUFFER: f64 = 3.0;
pub const BIAS_BAND_BUFFER: f64 = 0.05;

impl Thresholds {
    pub const fn new(
        breakout_rsi: f64,
        breakout_band: f64,
        pullback_rsi_max: f64,
        pullback_band: f64,
    ) -> Self {
        Self {
            breakout_rsi,
            breakout_band,
            pullback_rsi_max,
            pullback_band,
        }
    }

    /// Shift every threshold by the market-bias buffers.
    ///
    /// An uptrending market lowers all four values, a downtrending market
    /// raises them, a sideways or unknown market leaves them alone.
    pub fn with_market_bias(self, bias: Option<Trend>) -> Self {
        let sign = match bias {
            Some(Trend::Uptrend) => -1.0,
            Some(Trend::Downtrend) => 1.0,
            Some(Trend::Sideways) | None => return self,
        };
        Self {
            breakout_rsi: self.breakout_rsi + sign * BIAS_RSI_BUFFER,
            breakout_band: self.breakout_band + sign * BIAS_BAND_BUFFER,
            pullback_rsi_max: self.pullback_rsi_max + sign * BIAS_RSI_BUFFER,
            pullback_band: self.pullback_band + sign * BIAS_BAND_BUFFER,
        }
    }
}

/// Thresholds for levels 1..=5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityTable {
    pub levels: [Thresholds; 5],
}

impl Default for SensitivityTable {
    fn default() -> Self {
        Self {
            levels: [
                Thresholds::new(65.0, 0.70, 40.0, 0.30),
                Thresholds::new(60.0, 0.65, 45.0, 0.35),
                Thresholds::new(55.0, 0.55, 50.0, 0.45),
                Thresholds::new(52.0, 0.50, 52.0, 0.50),
                Thresholds::new(50.0, 0.45, 55.0, 0.55),
            ],
        }
    }
}

impl SensitivityTable {
    pub fn get(&self, sensitivity: Sensitivity) -> Thresholds {
        self.levels[sensitivity.index()]
    }

    /// True when each row is at least as loose as the one before it.
    pub fn is_monotonic(&self) -> bool {
        self.levels.windows(2).all(|w| {
            let (strict, loose) = (w[0], w[1]);
            loose.breakout_rsi <= strict.breakout_rsi
                && loose.breakout_band <= strict.breakout_band
                && loose.pullback_rsi_max >= strict.pullback_rsi_max
                && loose.pullback_band >= strict.pullback_band
        })
    }
}
