//! Bull flag: a strong pole followed by a tight, quiet consolidation.
//!
//! The window is split in half. The first half must gain more than
//! `min_pole_gain_pct` close-to-close; the second half's high-low range must
//! stay under `max_flag_range_pct` of its mean close.

use serde::{Deserialize, Serialize};

use super::{
    cap_confidence, max_high, mean_of, min_low, trailing, Bias, PatternDetector, PatternKind,
    PatternMatch,
};
use crate::domain::PriceBar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BullFlag {
    pub window: usize,
    pub min_pole_gain_pct: f64,
    pub max_flag_range_pct: f64,
    pub base_confidence: u32,
    /// Flag volume below this fraction of pole volume earns `volume_bonus`.
    pub volume_dry_up_ratio: f64,
    pub volume_bonus: u32,
    pub tight_range_pct: f64,
    pub tight_range_bonus: u32,
    pub strong_pole_pct: f64,
    pub strong_pole_bonus: u32,
}

impl Default for BullFlag {
    fn default() -> Self {
        Self {
            window: 20,
            min_pole_gain_pct: 5.0,
            max_flag_range_pct: 5.0,
            base_confidence: 60,
            volume_dry_up_ratio: 0.8,
            volume_bonus: 20,
            tight_range_pct: 3.0,
            tight_range_bonus: 10,
            strong_pole_pct: 10.0,
            strong_pole_bonus: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BullFlagReport {
    pub detected: bool,
    pub confidence: u8,
    pub pole_gain_pct: f64,
    pub flag_range_pct: f64,
    pub volume_ratio: f64,
    pub flag_high: f64,
}

impl BullFlag {
    pub fn analyze(&self, bars: &[PriceBar]) -> BullFlagReport {
        let Some(window) = trailing(bars, self.window.max(2)) else {
            return BullFlagReport::default();
        };
        let (pole, flag) = window.split_at(window.len() / 2);

        let pole_start = pole[0].close;
        let pole_end = pole[pole.len() - 1].close;
        let pole_gain_pct = (pole_end - pole_start) / pole_start * 100.0;

        let flag_high = max_high(flag);
        let flag_range_pct = (flag_high - min_low(flag)) / mean_of(flag, |b| b.close) * 100.0;

        let pole_volume = mean_of(pole, |b| b.volume);
        let volume_ratio = if pole_volume > 0.0 {
            mean_of(flag, |b| b.volume) / pole_volume
        } else {
            f64::NAN
        };

        let mut report = BullFlagReport {
            detected: false,
            confidence: 0,
            pole_gain_pct,
            flag_range_pct,
            volume_ratio,
            flag_high,
        };

        if !(pole_gain_pct > self.min_pole_gain_pct && flag_range_pct < self.max_flag_range_pct) {
            return report;
        }

        let mut score = self.base_confidence;
        if volume_ratio < self.volume_dry_up_ratio {
            score += self.volume_bonus;
        }
        if flag_range_pct < self.tight_range_pct {
            score += self.tight_range_bonus;
        }
        if pole_gain_pct > self.strong_pole_pct {
            score += self.strong_pole_bonus;
        }

        report.detected = true;
        report.confidence = cap_confidence(score);
        report
    }
}

impl PatternDetector for BullFlag {
    fn kind(&self) -> PatternKind {
        PatternKind::BullFlag
    }

    fn window(&self) -> usize {
        self.window
    }

    fn detect(&self, bars: &[PriceBar]) -> Option<PatternMatch> {
        let r = self.analyze(bars);
        r.detected.then(|| PatternMatch {
            kind: PatternKind::BullFlag,
            confidence: r.confidence,
            bias: Bias::Bullish,
            description: format!(
                "{:.1}% pole followed by a {:.1}% consolidation",
                r.pole_gain_pct, r.flag_range_pct
            ),
            action: format!("Buy a close above the flag high {:.2}", r.flag_high),
        })
    }
}
