//! Support/resistance levels and unfilled price gaps.
//!
//! Pivots use a centered window, so the most recent `window - window/2 - 1`
//! bars can never be pivots. Everything else here is causal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

/// Pivot prices closer than this (percent of the lower price) share a level.
pub const CLUSTER_TOLERANCE_PCT: f64 = 2.0;

/// Clustered levels split around the latest close.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    /// Below the close, nearest first (descending).
    pub support: Vec<f64>,
    /// Above the close, nearest first (ascending).
    pub resistance: Vec<f64>,
}

impl LevelSet {
    pub fn nearest_support(&self) -> Option<f64> {
        self.support.first().copied()
    }

    pub fn nearest_resistance(&self) -> Option<f64> {
        self.resistance.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty() && self.resistance.is_empty()
    }
}

/// Indices of pivot highs and pivot lows.
///
/// Bar i is a pivot high when its high equals the max over the `window`
/// bars `[i - window/2, i - window/2 + window - 1]`; pivot lows mirror on
/// the low. For an even window the span has one more bar before i than after.
pub fn pivot_points(bars: &[PriceBar], window: usize) -> (Vec<usize>, Vec<usize>) {
    let half = window / 2;
    let n = bars.len();
    let mut highs = Vec::new();
    let mut lows = Vec::new();

    if window == 0 || n < window {
        return (highs, lows);
    }

    for start in 0..=n - window {
        let i = start + half;
        let span = &bars[start..start + window];
        let max_high = span.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let min_low = span.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        if bars[i].high == max_high {
            highs.push(i);
        }
        if bars[i].low == min_low {
            lows.push(i);
        }
    }

    (highs, lows)
}

/// Greedy single-pass clustering over sorted prices.
///
/// A price joins the open cluster while it is within `tolerance_pct` of the
/// cluster's lowest member, which keeps every pair inside the tolerance.
/// Each cluster is represented by its mean. Output is ascending.
pub fn cluster_levels(prices: &[f64], tolerance_pct: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = prices.iter().copied().filter(|p| p.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let mut levels = Vec::new();
    let mut cluster: Vec<f64> = Vec::new();
    for price in sorted {
        if let Some(&anchor) = cluster.first() {
            let within = anchor > 0.0 && (price - anchor) / anchor * 100.0 < tolerance_pct;
            if !within {
                levels.push(mean(&cluster));
                cluster.clear();
            }
        }
        cluster.push(price);
    }
    if !cluster.is_empty() {
        levels.push(mean(&cluster));
    }
    levels
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Clustered pivot levels, ascending, before splitting around the close.
pub fn pivot_levels(bars: &[PriceBar], window: usize) -> Vec<f64> {
    let (highs, lows) = pivot_points(bars, window);
    let prices: Vec<f64> = highs
        .iter()
        .map(|&i| bars[i].high)
        .chain(lows.iter().map(|&i| bars[i].low))
        .collect();
    cluster_levels(&prices, CLUSTER_TOLERANCE_PCT)
}

/// Support and resistance around the latest close.
///
/// Needs at least `2 * window` bars; returns an empty set otherwise.
pub fn find_support_resistance(bars: &[PriceBar], window: usize, num_levels: usize) -> LevelSet {
    let Some(last) = bars.last() else {
        return LevelSet::default();
    };
    if window == 0 || bars.len() < 2 * window {
        return LevelSet::default();
    }

    let close = last.close;
    let levels = pivot_levels(bars, window);

    let mut support: Vec<f64> = levels.iter().copied().filter(|&l| l < close).collect();
    support.sort_by(|a, b| b.total_cmp(a));
    support.truncate(num_levels);

    let mut resistance: Vec<f64> = levels.into_iter().filter(|&l| l > close).collect();
    resistance.sort_by(f64::total_cmp);
    resistance.truncate(num_levels);

    LevelSet {
        support,
        resistance,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    GapUp,
    GapDown,
}

/// An unfilled gap between two consecutive sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub kind: GapKind,
    /// Session that opened the gap.
    pub date: NaiveDate,
    pub gap_low: f64,
    pub gap_high: f64,
    pub size_pct: f64,
}

impl Gap {
    pub fn midpoint(&self) -> f64 {
        (self.gap_low + self.gap_high) / 2.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapSet {
    /// Newest first.
    pub gap_ups: Vec<Gap>,
    /// Newest first.
    pub gap_downs: Vec<Gap>,
    pub nearest_gap: Option<Gap>,
}

/// Unfilled gaps within the trailing `lookback` bars.
///
/// A gap-up (low above the prior high by at least `min_gap_pct`) is filled
/// once a later low trades below its top. A gap-down is filled once a later
/// high trades above its bottom.
pub fn detect_gaps(bars: &[PriceBar], min_gap_pct: f64, lookback: usize) -> GapSet {
    let n = bars.len();
    let Some(last) = bars.last() else {
        return GapSet::default();
    };
    let start = n.saturating_sub(lookback).max(1);

    let mut gap_ups = Vec::new();
    let mut gap_downs = Vec::new();

    for i in start..n {
        let (prev, cur) = (&bars[i - 1], &bars[i]);
        let later = &bars[i + 1..];

        if cur.low > prev.high && prev.high > 0.0 {
            let size_pct = (cur.low - prev.high) / prev.high * 100.0;
            let filled = later.iter().any(|b| b.low < cur.low);
            if size_pct >= min_gap_pct && !filled {
                gap_ups.push(Gap {
                    kind: GapKind::GapUp,
                    date: cur.date,
                    gap_low: prev.high,
                    gap_high: cur.low,
                    size_pct,
                });
            }
        } else if cur.high < prev.low && prev.low > 0.0 {
            let size_pct = (prev.low - cur.high) / prev.low * 100.0;
            let filled = later.iter().any(|b| b.high > cur.high);
            if size_pct >= min_gap_pct && !filled {
                gap_downs.push(Gap {
                    kind: GapKind::GapDown,
                    date: cur.date,
                    gap_low: cur.high,
                    gap_high: prev.low,
                    size_pct,
                });
            }
        }
    }

    gap_ups.reverse();
    gap_downs.reverse();

    let close = last.close;
    let nearest_gap = gap_ups
        .iter()
        .chain(&gap_downs)
        .min_by(|a, b| {
            (a.midpoint() - close)
                .abs()
                .total_cmp(&(b.midpoint() - close).abs())
        })
        .copied();

    GapSet {
        gap_ups,
        gap_downs,
        nearest_gap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn flat_bars(n: usize, price: f64) -> Vec<PriceBar> {
        let mut bars = make_bars(&vec![price; n]);
        for b in &mut bars {
            b.high = price;
            b.low = price;
        }
        bars
    }

    #[test]
    fn cluster_collapses_near_duplicates() {
        let levels = cluster_levels(&[100.0, 100.5, 101.0, 120.0, 121.0], 2.0);
        assert_eq!(levels.len(), 2);
        assert!((levels[0] - 100.5).abs() < 1e-9);
        assert!((levels[1] - 120.5).abs() < 1e-9);
    }

    #[test]
    fn cluster_respects_pairwise_tolerance() {
        // Each step is under 2% but the chain spans more than 2%.
        let levels = cluster_levels(&[100.0, 101.5, 103.0, 104.5], 2.0);
        assert_eq!(levels.len(), 2);
    }

    #[test]
    fn flat_series_yields_single_level() {
        let bars = flat_bars(30, 50.0);
        let levels = pivot_levels(&bars, 10);
        assert_eq!(levels, vec![50.0]);
        // The only level equals the close: neither support nor resistance.
        let set = find_support_resistance(&bars, 10, 3);
        assert!(set.is_empty());
    }

    #[test]
    fn short_history_returns_empty() {
        let bars = make_bars(&[100.0; 19]);
        assert!(find_support_resistance(&bars, 10, 3).is_empty());
    }

    #[test]
    fn levels_split_around_close() {
        // Oscillate between ~90 and ~110, finish at 100.
        let closes: Vec<f64> = (0..60)
            .map(|i| match i % 20 {
                0..=4 => 90.0,
                10..=14 => 110.0,
                _ => 100.0,
            })
            .chain(std::iter::once(100.0))
            .collect();
        let set = find_support_resistance(&make_bars(&closes), 10, 2);
        assert!(!set.support.is_empty());
        assert!(!set.resistance.is_empty());
        assert!(set.support.iter().all(|&s| s < 100.0));
        assert!(set.resistance.iter().all(|&r| r > 100.0));
        assert!(set.support.windows(2).all(|w| w[0] >= w[1]));
        assert!(set.resistance.windows(2).all(|w| w[0] <= w[1]));
        assert!(set.support.len() <= 2 && set.resistance.len() <= 2);
    }

    #[test]
    fn recent_bars_are_never_pivots() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let (highs, _) = pivot_points(&make_bars(&closes), 10);
        assert!(highs.iter().all(|&i| i <= 25));
    }

    #[test]
    fn even_window_spans_exactly_window_bars() {
        // Bar 15 tops bars 10..=19; the higher bar 20 sits just outside.
        let mut closes = vec![100.0; 30];
        closes[15] = 110.0;
        closes[20] = 111.0;
        let (highs, _) = pivot_points(&make_bars(&closes), 10);
        assert!(highs.contains(&15));
        assert!(highs.contains(&20));
        assert!(highs.iter().all(|&i| (5..=25).contains(&i)));
    }

    #[test]
    fn odd_window_is_symmetric() {
        let mut closes = vec![100.0; 12];
        closes[5] = 105.0;
        closes[7] = 106.0;
        let (highs, _) = pivot_points(&make_bars(&closes), 5);
        // Span of bar 5 is 3..=7, which holds the higher bar 7.
        assert!(!highs.contains(&5));
        assert!(highs.contains(&7));
    }

    /// Open gap-down from `top` to 100, then an open gap-up from 88 to 92,
    /// finishing at `last_close`.
    fn two_open_gaps(top: f64, last_close: f64) -> Vec<PriceBar> {
        let mut bars = flat_bars(12, top);
        let set = |b: &mut PriceBar, high: f64, low: f64, close: f64| {
            b.open = close;
            b.high = high;
            b.low = low;
            b.close = close;
        };
        set(&mut bars[3], 100.0, 85.0, 90.0);
        for b in &mut bars[4..7] {
            set(b, 88.0, 86.0, 87.0);
        }
        for b in &mut bars[7..] {
            set(b, 100.0, 92.0, 94.0);
        }
        if let Some(b) = bars.last_mut() {
            b.close = last_close;
        }
        bars
    }

    #[test]
    fn nearest_gap_picks_closest_midpoint_across_kinds() {
        // Gap-up midpoint 90 is 4 away; gap-down midpoint 110 is 16 away.
        let gaps = detect_gaps(&two_open_gaps(120.0, 94.0), 2.0, 60);
        assert_eq!(gaps.gap_ups.len(), 1);
        assert_eq!(gaps.gap_downs.len(), 1);
        assert_eq!(gaps.nearest_gap, Some(gaps.gap_ups[0]));

        // Gap-down midpoint 101.5 is 2.5 away; gap-up midpoint 90 is 9 away.
        let gaps = detect_gaps(&two_open_gaps(103.0, 99.0), 2.0, 60);
        assert_eq!(gaps.gap_ups.len(), 1);
        assert_eq!(gaps.gap_downs.len(), 1);
        assert_eq!(gaps.nearest_gap, Some(gaps.gap_downs[0]));
    }

    #[test]
    fn unfilled_gap_up_is_reported() {
        let mut bars = flat_bars(10, 100.0);
        for b in bars.iter_mut().skip(5) {
            b.open = 105.0;
            b.high = 106.0;
            b.low = 105.0;
            b.close = 105.5;
        }
        let gaps = detect_gaps(&bars, 2.0, 60);
        assert_eq!(gaps.gap_ups.len(), 1);
        let gap = gaps.gap_ups[0];
        assert_eq!(gap.gap_low, 100.0);
        assert_eq!(gap.gap_high, 105.0);
        assert!((gap.size_pct - 5.0).abs() < 1e-9);
        assert_eq!(gaps.nearest_gap, Some(gap));
    }

    #[test]
    fn filled_gap_up_is_dropped() {
        let mut bars = flat_bars(10, 100.0);
        for b in bars.iter_mut().skip(5) {
            b.high = 106.0;
            b.low = 105.0;
            b.open = 105.0;
            b.close = 105.0;
        }
        bars[8].low = 102.0;
        assert!(detect_gaps(&bars, 2.0, 60).gap_ups.is_empty());
    }

    #[test]
    fn small_gap_below_threshold_is_ignored() {
        let mut bars = flat_bars(6, 100.0);
        for b in bars.iter_mut().skip(3) {
            b.high = 101.5;
            b.low = 101.0;
            b.open = 101.0;
            b.close = 101.0;
        }
        assert!(detect_gaps(&bars, 2.0, 60).gap_ups.is_empty());
    }

    #[test]
    fn unfilled_gap_down_is_reported() {
        let mut bars = flat_bars(8, 100.0);
        for b in bars.iter_mut().skip(4) {
            b.high = 95.0;
            b.low = 94.0;
            b.open = 95.0;
            b.close = 94.5;
        }
        let gaps = detect_gaps(&bars, 2.0, 60);
        assert_eq!(gaps.gap_downs.len(), 1);
        assert_eq!(gaps.gap_downs[0].gap_low, 95.0);
        assert_eq!(gaps.gap_downs[0].gap_high, 100.0);
        assert_eq!(gaps.nearest_gap.map(|g| g.kind), Some(GapKind::GapDown));
    }

    #[test]
    fn gaps_outside_lookback_are_ignored() {
        let mut bars = flat_bars(30, 100.0);
        for b in bars.iter_mut().skip(5) {
            b.high = 106.0;
            b.low = 105.0;
            b.open = 105.0;
            b.close = 105.0;
        }
        assert!(detect_gaps(&bars, 2.0, 10).gap_ups.is_empty());
        assert_eq!(detect_gaps(&bars, 2.0, 60).gap_ups.len(), 1);
    }
}
