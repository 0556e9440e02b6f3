//! Chart-pattern heuristics over a trailing window of bars.
//!
//! Each detector produces a typed report (`detected`, `confidence`, plus
//! pattern metrics). Detected reports convert into a [`PatternMatch`].
//! All cutoffs live in the per-detector parameter structs; their `Default`
//! impls carry the reference constants.

pub mod ascending_triangle;
pub mod bull_flag;
pub mod cup_handle;
pub mod double_bottom;

pub use ascending_triangle::{AscendingTriangle, AscendingTriangleReport};
pub use bull_flag::{BullFlag, BullFlagReport};
pub use cup_handle::{CupAndHandle, CupAndHandleReport};
pub use double_bottom::{DoubleBottom, DoubleBottomReport};

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    BullFlag,
    CupAndHandle,
    DoubleBottom,
    AscendingTriangle,
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PatternKind::BullFlag => "Bull Flag",
            PatternKind::CupAndHandle => "Cup and Handle",
            PatternKind::DoubleBottom => "Double Bottom",
            PatternKind::AscendingTriangle => "Ascending Triangle",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
}

/// A detected pattern, ready for ranking and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    /// 0..=100
    pub confidence: u8,
    pub bias: Bias,
    pub description: String,
    pub action: String,
}

/// A pattern heuristic over the trailing `window()` bars.
pub trait PatternDetector: Send + Sync {
    fn kind(&self) -> PatternKind;

    /// Bars the detector looks at. Shorter input never matches.
    fn window(&self) -> usize;

    fn detect(&self, bars: &[PriceBar]) -> Option<PatternMatch>;
}

/// Tunable constants for all four detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub bull_flag: BullFlag,
    pub cup_and_handle: CupAndHandle,
    pub double_bottom: DoubleBottom,
    pub ascending_triangle: AscendingTriangle,
}

impl PatternConfig {
    pub fn detectors(&self) -> [&dyn PatternDetector; 4] {
        [
            &self.bull_flag,
            &self.cup_and_handle,
            &self.double_bottom,
            &self.ascending_triangle,
        ]
    }
}

/// Run every detector and sort matches by confidence, highest first.
pub fn detect_patterns(bars: &[PriceBar], config: &PatternConfig) -> Vec<PatternMatch> {
    let mut matches: Vec<PatternMatch> = config
        .detectors()
        .iter()
        .filter_map(|d| d.detect(bars))
        .collect();
    matches.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    matches
}

/// Trailing `window` bars, or `None` if history is too short.
pub(crate) fn trailing(bars: &[PriceBar], window: usize) -> Option<&[PriceBar]> {
    if window == 0 || bars.len() < window {
        return None;
    }
    Some(&bars[bars.len() - window..])
}

pub(crate) fn max_high(bars: &[PriceBar]) -> f64 {
    bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max)
}

pub(crate) fn min_low(bars: &[PriceBar]) -> f64 {
    bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min)
}

pub(crate) fn mean_of(bars: &[PriceBar], field: impl Fn(&PriceBar) -> f64) -> f64 {
    if bars.is_empty() {
        return f64::NAN;
    }
    bars.iter().map(field).sum::<f64>() / bars.len() as f64
}

pub(crate) fn cap_confidence(score: u32) -> u8 {
    score.min(100) as u8
}
