//! Double bottom: two comparable lows separated by a meaningful peak.
//!
//! The first low is the window's lowest low; the second is the lowest low at
//! least `min_separation` bars away from it. The peak is the highest high
//! strictly between them.

use serde::{Deserialize, Serialize};

use super::{cap_confidence, trailing, Bias, PatternDetector, PatternKind, PatternMatch};
use crate::domain::PriceBar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleBottom {
    pub window: usize,
    pub min_separation: usize,
    pub max_low_diff_pct: f64,
    pub min_peak_rise_pct: f64,
    pub base_confidence: u32,
    pub close_lows_pct: f64,
    pub close_lows_bonus: u32,
    pub breakout_bonus: u32,
}

impl Default for DoubleBottom {
    fn default() -> Self {
        Self {
            window: 30,
            min_separation: 5,
            max_low_diff_pct: 3.0,
            min_peak_rise_pct: 5.0,
            base_confidence: 65,
            close_lows_pct: 2.0,
            close_lows_bonus: 15,
            breakout_bonus: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoubleBottomReport {
    pub detected: bool,
    pub confidence: u8,
    pub first_low: f64,
    pub second_low: f64,
    pub peak: f64,
    pub low_diff_pct: f64,
    /// Latest close already above the intervening peak.
    pub breakout: bool,
}

fn lowest(bars: &[PriceBar], eligible: impl Fn(usize) -> bool) -> Option<usize> {
    bars.iter()
        .enumerate()
        .filter(|(i, _)| eligible(*i))
        .min_by(|(_, a), (_, b)| a.low.total_cmp(&b.low))
        .map(|(i, _)| i)
}

impl DoubleBottom {
    pub fn analyze(&self, bars: &[PriceBar]) -> DoubleBottomReport {
        let Some(window) = trailing(bars, self.window) else {
            return DoubleBottomReport::default();
        };
        let Some(a) = lowest(window, |_| true) else {
            return DoubleBottomReport::default();
        };
        let sep = self.min_separation.max(2);
        let Some(b) = lowest(window, |i| i.abs_diff(a) >= sep) else {
            return DoubleBottomReport::default();
        };

        let (i1, i2) = (a.min(b), a.max(b));
        let (first_low, second_low) = (window[i1].low, window[i2].low);
        let peak = window[i1 + 1..i2]
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let low_diff_pct = (second_low - first_low).abs() / first_low.min(second_low) * 100.0;
        let peak_rise_pct = (peak - first_low) / first_low * 100.0;
        let breakout = window[window.len() - 1].close > peak;

        let mut report = DoubleBottomReport {
            detected: false,
            confidence: 0,
            first_low,
            second_low,
            peak,
            low_diff_pct,
            breakout,
        };

        if !(low_diff_pct <= self.max_low_diff_pct && peak_rise_pct >= self.min_peak_rise_pct) {
            return report;
        }

        let mut score = self.base_confidence;
        if low_diff_pct <= self.close_lows_pct {
            score += self.close_lows_bonus;
        }
        if breakout {
            score += self.breakout_bonus;
        }

        report.detected = true;
        report.confidence = cap_confidence(score);
        report
    }
}

impl PatternDetector for DoubleBottom {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleBottom
    }

    fn window(&self) -> usize {
        self.window
    }

    fn detect(&self, bars: &[PriceBar]) -> Option<PatternMatch> {
        let r = self.analyze(bars);
        r.detected.then(|| PatternMatch {
            kind: PatternKind::DoubleBottom,
            confidence: r.confidence,
            bias: Bias::Bullish,
            description: format!(
                "Lows {:.2} and {:.2} under a {:.2} peak",
                r.first_low, r.second_low, r.peak
            ),
            action: if r.breakout {
                format!("Breakout confirmed above {:.2}; buy pullbacks that hold it", r.peak)
            } else {
                format!("Buy a close above the neckline {:.2}", r.peak)
            },
        })
    }
}
