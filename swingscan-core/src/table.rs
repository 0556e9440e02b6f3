//! Indicator engine: the fixed bundle of derived columns over a bar series.
//!
//! Derived values at index i depend only on bars 0..=i. Undefined values
//! are stored as NaN and surfaced as `None` through [`IndicatorRow`].

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::indicators::{
    Atr, AvgVolume, BandPosition, Ema, HighestHigh, Indicator, LowestLow, RelVolume, Rsi,
};

pub const EMA_FAST: usize = 20;
pub const EMA_SLOW: usize = 50;
pub const RSI_LENGTH: usize = 14;
pub const ATR_LENGTH: usize = 14;
pub const BAND_PERIOD: usize = 20;
pub const BAND_STDEV_MULT: f64 = 2.0;
pub const RANGE_PERIOD: usize = 20;
pub const VOLUME_PERIOD: usize = 20;

/// Derived columns of the indicator table, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Ema20,
    Ema50,
    Rsi14,
    Atr14,
    BandPos20,
    Hh20,
    Ll20,
    AvgVol20,
    RelVolume,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Ema20,
        Column::Ema50,
        Column::Rsi14,
        Column::Atr14,
        Column::BandPos20,
        Column::Hh20,
        Column::Ll20,
        Column::AvgVol20,
        Column::RelVolume,
    ];

    /// The indicator that produces this column.
    pub fn indicator(self) -> Box<dyn Indicator> {
        match self {
            Column::Ema20 => Box::new(Ema::new(EMA_FAST)),
            Column::Ema50 => Box::new(Ema::new(EMA_SLOW)),
            Column::Rsi14 => Box::new(Rsi::new(RSI_LENGTH)),
            Column::Atr14 => Box::new(Atr::new(ATR_LENGTH)),
            Column::BandPos20 => Box::new(BandPosition::new(BAND_PERIOD, BAND_STDEV_MULT)),
            Column::Hh20 => Box::new(HighestHigh::new(RANGE_PERIOD)),
            Column::Ll20 => Box::new(LowestLow::new(RANGE_PERIOD)),
            Column::AvgVol20 => Box::new(AvgVolume::new(VOLUME_PERIOD)),
            Column::RelVolume => Box::new(RelVolume::new(VOLUME_PERIOD)),
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Column::Ema20 => "EMA20",
            Column::Ema50 => "EMA50",
            Column::Rsi14 => "RSI14",
            Column::Atr14 => "ATR14",
            Column::BandPos20 => "BandPos20",
            Column::Hh20 => "HH20",
            Column::Ll20 => "LL20",
            Column::AvgVol20 => "AvgVol20",
            Column::RelVolume => "RelVolume",
        };
        f.write_str(name)
    }
}

/// Bars plus the nine derived columns, all of equal length.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    bars: Vec<PriceBar>,
    columns: Vec<Vec<f64>>,
}

/// One bar with its derived values. `None` means not enough history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub bar: PriceBar,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub rsi14: Option<f64>,
    pub atr14: Option<f64>,
    pub bandpos20: Option<f64>,
    pub hh20: Option<f64>,
    pub ll20: Option<f64>,
    pub avgvol20: Option<f64>,
    pub relvolume: Option<f64>,
}

fn defined(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Bars needed before every column carries a real value on the last bar.
pub fn warmup_bars() -> usize {
    Column::ALL
        .iter()
        .map(|c| c.indicator().lookback())
        .max()
        .unwrap_or(0)
        + 1
}

/// Compute the full indicator bundle. Never fails: short input yields
/// NaN-filled columns for the unavailable prefix.
pub fn compute_indicators(bars: &[PriceBar]) -> IndicatorTable {
    let columns = Column::ALL
        .iter()
        .map(|c| c.indicator().compute(bars))
        .collect();
    IndicatorTable {
        bars: bars.to_vec(),
        columns,
    }
}

impl IndicatorTable {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn series(&self, column: Column) -> &[f64] {
        &self.columns[column as usize]
    }

    pub fn value(&self, column: Column, index: usize) -> Option<f64> {
        self.series(column).get(index).copied().and_then(defined)
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let bar = *self.bars.get(index)?;
        let v = |c| self.value(c, index);
        Some(IndicatorRow {
            bar,
            ema20: v(Column::Ema20),
            ema50: v(Column::Ema50),
            rsi14: v(Column::Rsi14),
            atr14: v(Column::Atr14),
            bandpos20: v(Column::BandPos20),
            hh20: v(Column::Hh20),
            ll20: v(Column::Ll20),
            avgvol20: v(Column::AvgVol20),
            relvolume: v(Column::RelVolume),
        })
    }

    pub fn last(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    pub fn rows(&self) -> impl Iterator<Item = IndicatorRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }
}

impl IndicatorRow {
    pub fn close(&self) -> f64 {
        self.bar.close
    }

    /// EMA20 above EMA50. `None` while either is undefined.
    pub fn ema_uptrend(&self) -> Option<bool> {
        Some(self.ema20? > self.ema50?)
    }
}
