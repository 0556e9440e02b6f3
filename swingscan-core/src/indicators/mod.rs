//! Series math and the per-bar indicator implementations.
//!
//! Every indicator implements [`Indicator`]: full bar history in, one value
//! per bar out. Undefined values are `f64::NAN` and callers treat them as
//! "insufficient data", never as zero.
//!
//! The free functions (`ema`, `rsi`, `atr`, rolling windows) are the
//! canonical formulas. The indicator structs are thin named wrappers used by
//! the engine and by the look-ahead tests.

pub mod atr;
pub mod bollinger;
pub mod channel;
pub mod ema;
pub mod rolling;
pub mod rsi;
pub mod volume;

pub use atr::{atr, true_range, wilder_average, Atr};
pub use bollinger::BandPosition;
pub use channel::{HighestHigh, LowestLow};
pub use ema::{ema, Ema};
pub use rolling::{rolling_max, rolling_mean, rolling_min, rolling_std};
pub use rsi::{rsi, Rsi, NEUTRAL_RSI};
pub use volume::{AvgVolume, RelVolume};

use crate::domain::PriceBar;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on bar t+1 or later. Every indicator must
/// pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Column name (e.g. "ema_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars whose output is a warmup value.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole series. Output length equals `bars.len()`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

pub(crate) fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
