//! Setup classification for the latest indicator row.
//!
//! Decision order:
//! 1. price/volume filters
//! 2. EMA20 > EMA50 gate (no confirmed setup or near-miss without it)
//! 3. Breakout, then Pullback, against the sensitivity thresholds
//! 4. near-miss proximity checks when nothing confirmed
//!
//! Classification is stateless: every scan evaluates the row fresh.

pub mod score;
pub mod sensitivity;

pub use score::{smart_score, ScoreInputs};
pub use sensitivity::{Sensitivity, SensitivityError, SensitivityTable, Thresholds};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SkipReason;
use crate::table::{Column, IndicatorRow};

/// EMA20 must clear EMA50 by this fraction to count as a trend.
pub const TREND_BAND: f64 = 0.02;

/// Fraction of price used as ATR when ATR is undefined or non-positive.
pub const ATR_FALLBACK_PCT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

impl Trend {
    pub fn from_emas(ema20: f64, ema50: f64) -> Self {
        if ema20 > ema50 * (1.0 + TREND_BAND) {
            Trend::Uptrend
        } else if ema20 < ema50 * (1.0 - TREND_BAND) {
            Trend::Downtrend
        } else {
            Trend::Sideways
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Uptrend => "Uptrend",
            Trend::Downtrend => "Downtrend",
            Trend::Sideways => "Sideways",
        })
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uptrend" | "up" => Ok(Trend::Uptrend),
            "downtrend" | "down" => Ok(Trend::Downtrend),
            "sideways" | "flat" => Ok(Trend::Sideways),
            other => Err(format!("unknown trend: {other}")),
        }
    }
}

/// Which confirmed setups a scan looks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Pullback,
    Breakout,
    #[default]
    Both,
}

impl ScanMode {
    pub fn allows_breakout(self) -> bool {
        matches!(self, ScanMode::Breakout | ScanMode::Both)
    }

    pub fn allows_pullback(self) -> bool {
        matches!(self, ScanMode::Pullback | ScanMode::Both)
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pullback" => Ok(ScanMode::Pullback),
            "breakout" => Ok(ScanMode::Breakout),
            "both" => Ok(ScanMode::Both),
            other => Err(format!("unknown scan mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetupKind {
    Breakout,
    Pullback,
    NearMiss,
    None,
}

impl fmt::Display for SetupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetupKind::Breakout => "Breakout",
            SetupKind::Pullback => "Pullback",
            SetupKind::NearMiss => "NearMiss",
            SetupKind::None => "None",
        })
    }
}

/// Which proximity rule produced a near-miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearMissKind {
    BreakoutProximity,
    PullbackProximity,
    NearHigh,
    NearLow,
}

/// Widened ranges for near-miss detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearMissRules {
    pub breakout_rsi: [f64; 2],
    pub breakout_band: [f64; 2],
    pub pullback_rsi: [f64; 2],
    pub pullback_band: [f64; 2],
    /// Within this percent below the 20-day high.
    pub near_high_pct: f64,
    /// Within this many ATRs above the 20-day low.
    pub near_low_atr_mult: f64,
}

impl Default for NearMissRules {
    fn default() -> Self {
        Self {
            breakout_rsi: [40.0, 67.0],
            breakout_band: [0.35, 0.70],
            pullback_rsi: [40.0, 70.0],
            pullback_band: [0.20, 0.60],
            near_high_pct: 15.0,
            near_low_atr_mult: 4.0,
        }
    }
}

fn within(value: f64, [lo, hi]: [f64; 2]) -> bool {
    (lo..=hi).contains(&value)
}

impl NearMissKind {
    pub fn label(self, rules: &NearMissRules) -> String {
        match self {
            NearMissKind::BreakoutProximity => "RSI/Band breakout proximity".to_string(),
            NearMissKind::PullbackProximity => "RSI/Band pullback proximity".to_string(),
            NearMissKind::NearHigh => format!("≤{:.0}% below 20-day high", rules.near_high_pct),
            NearMissKind::NearLow => {
                format!("≤{:.1}×ATR above 20-day low", rules.near_low_atr_mult)
            }
        }
    }
}

/// Price and liquidity bounds applied before any classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub price_min: f64,
    pub price_max: f64,
    pub min_volume: f64,
    pub min_history_bars: usize,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            price_min: 5.0,
            price_max: 500.0,
            min_volume: 500_000.0,
            min_history_bars: 60,
        }
    }
}

impl Filters {
    pub fn check(&self, row: &IndicatorRow) -> Result<(), SkipReason> {
        let price = row.bar.close;
        if !(self.price_min..=self.price_max).contains(&price) {
            return Err(SkipReason::PriceOutOfRange {
                price,
                min: self.price_min,
                max: self.price_max,
            });
        }
        if !(row.bar.volume >= self.min_volume) {
            return Err(SkipReason::VolumeTooLow {
                volume: row.bar.volume,
                min: self.min_volume,
            });
        }
        Ok(())
    }
}

/// Outcome of classifying one row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub setup: SetupKind,
    pub near_miss: Option<NearMissKind>,
    pub trend: Trend,
    pub ema_uptrend: bool,
    pub rsi: f64,
    pub band: f64,
    /// ATR14, or the price-based fallback when ATR is unusable.
    pub atr: f64,
}

impl Classification {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.setup, SetupKind::Breakout | SetupKind::Pullback)
    }

    /// "Breakout in Uptrend", "Potential ≤15% below 20-day high in Sideways", ...
    pub fn context_label(&self, rules: &NearMissRules) -> String {
        match (self.setup, self.near_miss) {
            (SetupKind::Breakout | SetupKind::Pullback, _) => {
                format!("{} in {}", self.setup, self.trend)
            }
            (_, Some(kind)) => format!("Potential {} in {}", kind.label(rules), self.trend),
            _ => self.trend.to_string(),
        }
    }
}

fn required(value: Option<f64>, column: Column) -> Result<f64, SkipReason> {
    value.ok_or(SkipReason::UndefinedIndicator { column })
}

/// ATR, falling back to a fixed fraction of price when undefined or non-positive.
pub fn effective_atr(atr: Option<f64>, price: f64) -> f64 {
    match atr {
        Some(a) if a > 0.0 => a,
        _ => price * ATR_FALLBACK_PCT,
    }
}

/// Threshold-driven classifier for one scan configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupClassifier {
    pub filters: Filters,
    pub thresholds: Thresholds,
    pub mode: ScanMode,
    pub near_miss: NearMissRules,
}

impl SetupClassifier {
    /// Resolve the sensitivity row and apply the market-bias shift once.
    pub fn new(
        table: &SensitivityTable,
        sensitivity: Sensitivity,
        mode: ScanMode,
        market_bias: Option<Trend>,
    ) -> Self {
        Self {
            filters: Filters::default(),
            thresholds: table.get(sensitivity).with_market_bias(market_bias),
            mode,
            near_miss: NearMissRules::default(),
        }
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_near_miss(mut self, rules: NearMissRules) -> Self {
        self.near_miss = rules;
        self
    }

    pub fn classify(&self, row: &IndicatorRow) -> Result<Classification, SkipReason> {
        self.filters.check(row)?;

        let px = row.bar.close;
        let ema20 = required(row.ema20, Column::Ema20)?;
        let ema50 = required(row.ema50, Column::Ema50)?;
        let rsi = required(row.rsi14, Column::Rsi14)?;
        let band = required(row.bandpos20, Column::BandPos20)?;
        let atr = effective_atr(row.atr14, px);
        let ema_uptrend = ema20 > ema50;
        let t = &self.thresholds;

        let mut setup = SetupKind::None;
        let mut near_miss = None;

        if ema_uptrend {
            if self.mode.allows_breakout() && rsi > t.breakout_rsi && band > t.breakout_band {
                setup = SetupKind::Breakout;
            } else if self.mode.allows_pullback()
                && rsi < t.pullback_rsi_max
                && band <= t.pullback_band
                && px <= ema20
            {
                setup = SetupKind::Pullback;
            }

            if setup == SetupKind::None {
                near_miss = self.near_miss_kind(row, rsi, band, atr);
                if near_miss.is_some() {
                    setup = SetupKind::NearMiss;
                }
            }
        }

        if setup == SetupKind::None {
            return Err(SkipReason::NoSignal);
        }

        Ok(Classification {
            setup,
            near_miss,
            trend: Trend::from_emas(ema20, ema50),
            ema_uptrend,
            rsi,
            band,
            atr,
        })
    }

    /// Price proximity to the 20-day range wins over the RSI/band ranges.
    fn near_miss_kind(
        &self,
        row: &IndicatorRow,
        rsi: f64,
        band: f64,
        atr: f64,
    ) -> Option<NearMissKind> {
        let rules = &self.near_miss;
        let px = row.bar.close;

        if let Some(hh) = row.hh20.filter(|&h| h > 0.0) {
            if (hh - px) / hh <= rules.near_high_pct / 100.0 {
                return Some(NearMissKind::NearHigh);
            }
        }
        if let Some(ll) = row.ll20 {
            if px - ll <= rules.near_low_atr_mult * atr {
                return Some(NearMissKind::NearLow);
            }
        }

        if self.mode.allows_breakout()
            && within(rsi, rules.breakout_rsi)
            && within(band, rules.breakout_band)
        {
            Some(NearMissKind::BreakoutProximity)
        } else if self.mode.allows_pullback()
            && within(rsi, rules.pullback_rsi)
            && within(band, rules.pullback_band)
        {
            Some(NearMissKind::PullbackProximity)
        } else {
            None
        }
    }
}

/// Coarse label used by watchlist views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LooseSetup {
    Breakout,
    Pullback,
    Neutral,
}

/// Loose trend/momentum label with no sensitivity table.
///
/// Uptrend with RSI ≥ 50 is a Breakout, uptrend with weaker RSI a Pullback.
/// Outside an uptrend, RSI under 60 still reads as a Pullback candidate.
pub fn classify_setup(row: &IndicatorRow) -> LooseSetup {
    let (Some(ema20), Some(ema50), Some(rsi)) = (row.ema20, row.ema50, row.rsi14) else {
        return LooseSetup::Neutral;
    };
    match (ema20 > ema50, rsi) {
        (true, r) if r >= 50.0 => LooseSetup::Breakout,
        (true, _) => LooseSetup::Pullback,
        (false, r) if r < 60.0 => LooseSetup::Pullback,
        _ => LooseSetup::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;
    use chrono::NaiveDate;

    fn row(close: f64, ema20: f64, ema50: f64, rsi: f64, band: f64) -> IndicatorRow {
        IndicatorRow {
            bar: PriceBar::new(
                NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                close,
                close * 1.01,
                close * 0.99,
                close,
                1_000_000.0,
            ),
            ema20: Some(ema20),
            ema50: Some(ema50),
            rsi14: Some(rsi),
            atr14: Some(1.0),
            bandpos20: Some(band),
            hh20: Some(close * 1.5),
            ll20: Some(close * 0.5),
            avgvol20: Some(1_000_000.0),
            relvolume: Some(1.0),
        }
    }

    fn classifier(level: u8, mode: ScanMode) -> SetupClassifier {
        SetupClassifier::new(
            &SensitivityTable::default(),
            Sensitivity::new(level).unwrap(),
            mode,
            None,
        )
    }

    #[test]
    fn breakout_in_uptrend() {
        let c = classifier(3, ScanMode::Both)
            .classify(&row(100.0, 98.0, 90.0, 60.0, 0.8))
            .unwrap();
        assert_eq!(c.setup, SetupKind::Breakout);
        assert_eq!(c.trend, Trend::Uptrend);
        assert_eq!(c.context_label(&NearMissRules::default()), "Breakout in Uptrend");
    }

    #[test]
    fn pullback_requires_close_at_or_below_ema20() {
        let cl = classifier(3, ScanMode::Pullback);
        let c = cl.classify(&row(100.0, 100.0, 99.0, 45.0, 0.3)).unwrap();
        assert_eq!(c.setup, SetupKind::Pullback);
        assert_eq!(c.trend, Trend::Sideways);

        let above = cl.classify(&row(100.0, 99.5, 99.0, 45.0, 0.3)).unwrap();
        assert_ne!(above.setup, SetupKind::Pullback);
    }

    #[test]
    fn breakout_mode_ignores_pullbacks() {
        let c = classifier(3, ScanMode::Breakout)
            .classify(&row(100.0, 100.0, 99.0, 45.0, 0.4))
            .unwrap();
        assert_eq!(c.setup, SetupKind::NearMiss);
        assert_eq!(c.near_miss, Some(NearMissKind::BreakoutProximity));
    }

    #[test]
    fn downtrend_never_classifies() {
        let err = classifier(5, ScanMode::Both)
            .classify(&row(100.0, 90.0, 95.0, 70.0, 0.9))
            .unwrap_err();
        assert_eq!(err, SkipReason::NoSignal);
    }

    #[test]
    fn near_high_beats_rsi_band_proximity() {
        let mut r = row(100.0, 98.0, 97.0, 50.0, 0.5);
        r.hh20 = Some(110.0);
        let c = classifier(1, ScanMode::Both).classify(&r).unwrap();
        assert_eq!(c.setup, SetupKind::NearMiss);
        assert_eq!(c.near_miss, Some(NearMissKind::NearHigh));
        assert_eq!(
            c.context_label(&NearMissRules::default()),
            "Potential ≤15% below 20-day high in Sideways"
        );
    }

    #[test]
    fn near_low_uses_atr_distance() {
        let mut r = row(100.0, 98.0, 97.0, 20.0, 0.1);
        r.ll20 = Some(97.0);
        r.atr14 = Some(1.0);
        let c = classifier(1, ScanMode::Both).classify(&r).unwrap();
        assert_eq!(c.near_miss, Some(NearMissKind::NearLow));
    }

    #[test]
    fn rsi_band_proximity_when_far_from_range_edges() {
        let c = classifier(1, ScanMode::Both)
            .classify(&row(100.0, 98.0, 97.0, 50.0, 0.5))
            .unwrap();
        assert_eq!(c.near_miss, Some(NearMissKind::BreakoutProximity));

        let c = classifier(1, ScanMode::Pullback)
            .classify(&row(100.0, 98.0, 97.0, 68.0, 0.25))
            .unwrap();
        assert_eq!(c.near_miss, Some(NearMissKind::PullbackProximity));
    }

    #[test]
    fn filters_reject_before_classification() {
        let cl = classifier(3, ScanMode::Both);
        let cheap = row(2.0, 2.0, 1.0, 60.0, 0.8);
        assert!(matches!(
            cl.classify(&cheap),
            Err(SkipReason::PriceOutOfRange { .. })
        ));
        let mut thin = row(100.0, 98.0, 90.0, 60.0, 0.8);
        thin.bar.volume = 10_000.0;
        assert!(matches!(
            cl.classify(&thin),
            Err(SkipReason::VolumeTooLow { .. })
        ));
    }

    #[test]
    fn undefined_band_is_reported() {
        let mut r = row(100.0, 98.0, 90.0, 60.0, 0.8);
        r.bandpos20 = None;
        assert_eq!(
            classifier(3, ScanMode::Both).classify(&r).unwrap_err(),
            SkipReason::UndefinedIndicator {
                column: Column::BandPos20
            }
        );
    }

    #[test]
    fn market_bias_shifts_breakout_threshold() {
        // RSI 53 fails level 3 (55) but passes with an uptrend bias (52).
        let mut r = row(100.0, 98.0, 90.0, 53.0, 0.8);
        r.hh20 = Some(110.0);
        let neutral = classifier(3, ScanMode::Breakout).classify(&r).unwrap();
        assert_eq!(neutral.setup, SetupKind::NearMiss);
        let biased = SetupClassifier::new(
            &SensitivityTable::default(),
            Sensitivity::default(),
            ScanMode::Breakout,
            Some(Trend::Uptrend),
        )
        .classify(&r)
        .unwrap();
        assert_eq!(biased.setup, SetupKind::Breakout);
    }

    #[test]
    fn atr_fallback_applies() {
        assert_eq!(effective_atr(None, 200.0), 2.0);
        assert_eq!(effective_atr(Some(0.0), 200.0), 2.0);
        assert_eq!(effective_atr(Some(3.5), 200.0), 3.5);
    }

    #[test]
    fn loose_classification() {
        assert_eq!(classify_setup(&row(100.0, 98.0, 90.0, 55.0, 0.5)), LooseSetup::Breakout);
        assert_eq!(classify_setup(&row(100.0, 98.0, 90.0, 45.0, 0.5)), LooseSetup::Pullback);
        assert_eq!(classify_setup(&row(100.0, 90.0, 98.0, 45.0, 0.5)), LooseSetup::Pullback);
        assert_eq!(classify_setup(&row(100.0, 90.0, 98.0, 65.0, 0.5)), LooseSetup::Neutral);
        let mut r = row(100.0, 98.0, 90.0, 55.0, 0.5);
        r.ema50 = None;
        assert_eq!(classify_setup(&r), LooseSetup::Neutral);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("Breakout".parse::<ScanMode>().unwrap(), ScanMode::Breakout);
        assert!("sideways".parse::<ScanMode>().is_err());
    }
}
