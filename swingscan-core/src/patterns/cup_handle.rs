//! Cup and handle: a rounded decline and recovery with a shallow final pullback.
//!
//! The window is split in thirds (left lip, bottom, right lip). Depth is
//! measured from the left high to the bottom low; the right high must
//! recover most of the way. The final quarter is the handle.

use serde::{Deserialize, Serialize};

use super::{
    cap_confidence, max_high, mean_of, min_low, trailing, Bias, PatternDetector, PatternKind,
    PatternMatch,
};
use crate::domain::PriceBar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CupAndHandle {
    pub window: usize,
    pub min_depth_pct: f64,
    pub max_depth_pct: f64,
    /// Right high as a fraction of the left high.
    pub min_recovery: f64,
    pub max_handle_range_pct: f64,
    pub base_confidence: u32,
    pub ideal_depth_min_pct: f64,
    pub ideal_depth_max_pct: f64,
    pub ideal_depth_bonus: u32,
    pub strong_recovery: f64,
    pub strong_recovery_bonus: u32,
}

impl Default for CupAndHandle {
    fn default() -> Self {
        Self {
            window: 40,
            min_depth_pct: 12.0,
            max_depth_pct: 33.0,
            min_recovery: 0.95,
            max_handle_range_pct: 10.0,
            base_confidence: 70,
            ideal_depth_min_pct: 15.0,
            ideal_depth_max_pct: 25.0,
            ideal_depth_bonus: 15,
            strong_recovery: 0.98,
            strong_recovery_bonus: 15,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CupAndHandleReport {
    pub detected: bool,
    pub confidence: u8,
    pub depth_pct: f64,
    pub recovery: f64,
    pub handle_range_pct: f64,
    pub left_high: f64,
}

impl CupAndHandle {
    pub fn analyze(&self, bars: &[PriceBar]) -> CupAndHandleReport {
        let Some(window) = trailing(bars, self.window.max(4)) else {
            return CupAndHandleReport::default();
        };
        let n = window.len();
        let left = &window[..n / 3];
        let bottom = &window[n / 3..2 * n / 3];
        let right = &window[2 * n / 3..];
        let handle = &window[3 * n / 4..];

        let left_high = max_high(left);
        let depth_pct = (left_high - min_low(bottom)) / left_high * 100.0;
        let recovery = max_high(right) / left_high;
        let handle_range_pct =
            (max_high(handle) - min_low(handle)) / mean_of(handle, |b| b.close) * 100.0;

        let mut report = CupAndHandleReport {
            detected: false,
            confidence: 0,
            depth_pct,
            recovery,
            handle_range_pct,
            left_high,
        };

        let cup = (self.min_depth_pct..=self.max_depth_pct).contains(&depth_pct);
        if !(cup && recovery >= self.min_recovery && handle_range_pct < self.max_handle_range_pct)
        {
            return report;
        }

        let mut score = self.base_confidence;
        if (self.ideal_depth_min_pct..=self.ideal_depth_max_pct).contains(&depth_pct) {
            score += self.ideal_depth_bonus;
        }
        if recovery >= self.strong_recovery {
            score += self.strong_recovery_bonus;
        }

        report.detected = true;
        report.confidence = cap_confidence(score);
        report
    }
}

impl PatternDetector for CupAndHandle {
    fn kind(&self) -> PatternKind {
        PatternKind::CupAndHandle
    }

    fn window(&self) -> usize {
        self.window
    }

    fn detect(&self, bars: &[PriceBar]) -> Option<PatternMatch> {
        let r = self.analyze(bars);
        r.detected.then(|| PatternMatch {
            kind: PatternKind::CupAndHandle,
            confidence: r.confidence,
            bias: Bias::Bullish,
            description: format!(
                "{:.1}% deep cup, right side back to {:.0}% of the left lip",
                r.depth_pct,
                r.recovery * 100.0
            ),
            action: format!("Buy a breakout above the lip {:.2}", r.left_high),
        })
    }
}
