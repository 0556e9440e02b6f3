//! Intraday momentum snapshot for an open trade.
//!
//! Uses the same EMA and RSI formulas as the daily engine.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::error::CoreError;
use crate::indicators::{ema, rolling_mean, rsi};

pub const MIN_INTRADAY_BARS: usize = 50;
const FAST: usize = 20;
const SLOW: usize = 50;
const RSI_LEN: usize = 14;
const VOLUME_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntradaySignals {
    pub rsi: f64,
    pub ema_fast_above_slow: bool,
    pub ema_slope_up: bool,
    /// Last bar volume over its 20-bar average. `None` when the average is zero.
    pub vol_ratio: Option<f64>,
    pub last_close: f64,
}

impl IntradaySignals {
    pub fn compute(bars: &[PriceBar]) -> Result<Self, CoreError> {
        if bars.len() < MIN_INTRADAY_BARS {
            return Err(CoreError::insufficient(MIN_INTRADAY_BARS, bars.len()));
        }
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let n = closes.len();

        let fast = ema(&closes, FAST);
        let slow = ema(&closes, SLOW);
        let rsi_series = rsi(&closes, RSI_LEN);
        let avg_volume = rolling_mean(&volumes, VOLUME_WINDOW);

        let last_rsi = rsi_series[n - 1];
        if !last_rsi.is_finite() || !fast[n - 1].is_finite() || !slow[n - 1].is_finite() {
            return Err(CoreError::InvalidBar {
                index: n - 1,
                reason: "undefined intraday indicator".to_string(),
            });
        }

        let avg = avg_volume[n - 1];
        Ok(Self {
            rsi: last_rsi,
            ema_fast_above_slow: fast[n - 1] > slow[n - 1],
            ema_slope_up: fast[n - 1] > fast[n - 2],
            vol_ratio: (avg > 0.0).then(|| volumes[n - 1] / avg),
            last_close: closes[n - 1],
        })
    }
}
