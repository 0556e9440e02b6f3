//! PriceBar: one OHLCV session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// OHLCV bar for a single session.
///
/// Bars are immutable once loaded. Derived columns live in
/// [`IndicatorTable`](crate::table::IndicatorTable), never on the bar itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLCV sanity check: high >= low, high >= open/close, positive prices.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }

    /// Midpoint of the session range.
    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

/// Reject malformed input before it reaches the indicator engine.
///
/// Every bar must pass [`PriceBar::is_sane`] and dates must be strictly
/// ascending (no duplicates).
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), CoreError> {
    for (index, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            let reason = if bar.is_void() {
                "NaN field".to_string()
            } else {
                format!(
                    "inconsistent OHLCV o={} h={} l={} c={} v={}",
                    bar.open, bar.high, bar.low, bar.close, bar.volume
                )
            };
            return Err(CoreError::InvalidBar { index, reason });
        }
        if index > 0 {
            let previous = bars[index - 1].date;
            if bar.date <= previous {
                return Err(CoreError::OutOfOrder {
                    index,
                    previous,
                    current: bar.date,
                });
            }
        }
    }
    Ok(())
}
