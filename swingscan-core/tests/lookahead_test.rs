//! Look-ahead contamination tests for every indicator column.
//!
//! No indicator value at bar t may depend on bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200). Bars 0..100 must be identical between both runs.

use chrono::NaiveDate;
use swingscan_core::domain::PriceBar;
use swingscan_core::indicators::*;
use swingscan_core::table::{compute_indicators, Column};

/// N bars of a deterministic pseudo-random walk.
fn make_test_bars(n: usize) -> Vec<PriceBar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(PriceBar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1000.0 + (i as f64 * 100.0),
        });
    }

    bars
}

fn assert_same_prefix(name: &str, truncated: &[f64], full: &[f64]) {
    for (i, (&t, &f)) in truncated.iter().zip(full).enumerate() {
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[PriceBar], truncated_len: usize) {
    let truncated = indicator.compute(&full_bars[..truncated_len]);
    let full = indicator.compute(full_bars);
    assert_eq!(truncated.len(), truncated_len, "{}", indicator.name());
    assert_eq!(full.len(), full_bars.len(), "{}", indicator.name());
    assert_same_prefix(indicator.name(), &truncated, &full);

    // The first real value lands on the bar right after the warmup.
    let warm = indicator.lookback() + 1;
    let first = indicator.compute(&full_bars[..warm]);
    assert!(
        first[warm - 1].is_finite(),
        "{}: undefined after {} warmup bars",
        indicator.name(),
        indicator.lookback()
    );
    assert_eq!(first[warm - 1], full[warm - 1], "{}", indicator.name());
}

#[test]
fn lookahead_ema() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Ema::new(20), &bars, 100);
    assert_no_lookahead(&Ema::new(50), &bars, 100);
}

#[test]
fn lookahead_rsi() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
    assert_no_lookahead(&Rsi::new(7), &bars, 100);
}

#[test]
fn lookahead_atr() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Atr::new(14), &bars, 100);
}

#[test]
fn lookahead_band_position() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&BandPosition::new(20, 2.0), &bars, 100);
}

#[test]
fn lookahead_range_and_volume() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&HighestHigh::new(20), &bars, 100);
    assert_no_lookahead(&LowestLow::new(20), &bars, 100);
    assert_no_lookahead(&AvgVolume::new(20), &bars, 100);
    assert_no_lookahead(&RelVolume::new(20), &bars, 100);
}

#[test]
fn lookahead_indicator_table() {
    let bars = make_test_bars(200);
    let truncated = compute_indicators(&bars[..100]);
    let full = compute_indicators(&bars);
    for column in Column::ALL {
        assert_same_prefix(
            &column.to_string(),
            truncated.series(column),
            &full.series(column)[..100],
        );
    }
}
