//! Ascending triangle: a flat ceiling with rising lows beneath it.
//!
//! Resistance is the window's highest high. A touch is any bar whose high
//! comes within `touch_tolerance_pct` of it. Support is rising when the
//! second half's mean low clears the first half's by `min_support_rise_pct`.

use serde::{Deserialize, Serialize};

use super::{
    cap_confidence, max_high, mean_of, trailing, Bias, PatternDetector, PatternKind, PatternMatch,
};
use crate::domain::PriceBar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AscendingTriangle {
    pub window: usize,
    pub touch_tolerance_pct: f64,
    pub min_touches: usize,
    pub min_support_rise_pct: f64,
    pub base_confidence: u32,
    pub many_touches: usize,
    pub many_touches_bonus: u32,
    pub volume_contraction_bonus: u32,
    pub strong_support_rise_pct: f64,
    pub strong_support_bonus: u32,
}

impl Default for AscendingTriangle {
    fn default() -> Self {
        Self {
            window: 30,
            touch_tolerance_pct: 2.0,
            min_touches: 2,
            min_support_rise_pct: 2.0,
            base_confidence: 60,
            many_touches: 3,
            many_touches_bonus: 15,
            volume_contraction_bonus: 15,
            strong_support_rise_pct: 5.0,
            strong_support_bonus: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AscendingTriangleReport {
    pub detected: bool,
    pub confidence: u8,
    pub resistance: f64,
    pub touches: usize,
    pub support_rise_pct: f64,
    pub volume_contracting: bool,
}

impl AscendingTriangle {
    pub fn analyze(&self, bars: &[PriceBar]) -> AscendingTriangleReport {
        let Some(window) = trailing(bars, self.window.max(2)) else {
            return AscendingTriangleReport::default();
        };
        let resistance = max_high(window);
        let floor = resistance * (1.0 - self.touch_tolerance_pct / 100.0);
        let touches = window.iter().filter(|b| b.high >= floor).count();

        let (first, second) = window.split_at(window.len() / 2);
        let first_low = mean_of(first, |b| b.low);
        let support_rise_pct = (mean_of(second, |b| b.low) / first_low - 1.0) * 100.0;
        let volume_contracting = mean_of(second, |b| b.volume) < mean_of(first, |b| b.volume);

        let mut report = AscendingTriangleReport {
            detected: false,
            confidence: 0,
            resistance,
            touches,
            support_rise_pct,
            volume_contracting,
        };

        if !(touches >= self.min_touches && support_rise_pct > self.min_support_rise_pct) {
            return report;
        }

        let mut score = self.base_confidence;
        if touches >= self.many_touches {
            score += self.many_touches_bonus;
        }
        if volume_contracting {
            score += self.volume_contraction_bonus;
        }
        if support_rise_pct >= self.strong_support_rise_pct {
            score += self.strong_support_bonus;
        }

        report.detected = true;
        report.confidence = cap_confidence(score);
        report
    }
}

impl PatternDetector for AscendingTriangle {
    fn kind(&self) -> PatternKind {
        PatternKind::AscendingTriangle
    }

    fn window(&self) -> usize {
        self.window
    }

    fn detect(&self, bars: &[PriceBar]) -> Option<PatternMatch> {
        let r = self.analyze(bars);
        r.detected.then(|| PatternMatch {
            kind: PatternKind::AscendingTriangle,
            confidence: r.confidence,
            bias: Bias::Bullish,
            description: format!(
                "{} touches of {:.2} with lows rising {:.1}%",
                r.touches, r.resistance, r.support_rise_pct
            ),
            action: format!("Buy a close above resistance {:.2}", r.resistance),
        })
    }
}
