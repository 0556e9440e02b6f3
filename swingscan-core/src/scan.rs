//! Per-symbol evaluation: bars in, one scan record or a skip reason out.

use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::context::ScanContext;
use crate::domain::{validate_bars, PriceBar};
use crate::error::SkipReason;
use crate::levels::{detect_gaps, find_support_resistance, GapSet, LevelSet};
use crate::patterns::{detect_patterns, PatternMatch};
use crate::plan::{snap_to_levels, stop_price, target_price, TargetMode, TradePlan};
use crate::setup::{smart_score, NearMissKind, ScoreInputs, SetupClassifier, SetupKind, Trend};
use crate::table::{compute_indicators, warmup_bars, IndicatorRow};

/// Result of one symbol in one scan. Never merged across scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub symbol: String,
    pub sector: Option<String>,
    /// Latest bar and its nine derived values.
    pub row: IndicatorRow,
    pub setup: SetupKind,
    pub near_miss: Option<NearMissKind>,
    pub trend: Trend,
    pub context: String,
    pub smart_score: f64,
    /// ATR used for the plan (ATR14 or the price-based fallback).
    pub atr: f64,
    pub plan: TradePlan,
    pub levels: LevelSet,
    pub gaps: GapSet,
    pub patterns: Vec<PatternMatch>,
}

impl ScanRecord {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.setup, SetupKind::Breakout | SetupKind::Pullback)
    }

    pub fn price(&self) -> f64 {
        self.row.bar.close
    }
}

/// Evaluate one symbol with a classifier built from `config` and `ctx`.
pub fn evaluate_symbol(
    symbol: &str,
    bars: &[PriceBar],
    config: &ScanConfig,
    ctx: &ScanContext,
) -> Result<ScanRecord, SkipReason> {
    let classifier = config.classifier(&ctx.market);
    evaluate_with(&classifier, symbol, bars, config, ctx)
}

/// Same as [`evaluate_symbol`] with a prebuilt classifier, for scans that
/// evaluate many symbols under one configuration.
pub fn evaluate_with(
    classifier: &SetupClassifier,
    symbol: &str,
    bars: &[PriceBar],
    config: &ScanConfig,
    ctx: &ScanContext,
) -> Result<ScanRecord, SkipReason> {
    validate_bars(bars)?;
    let required = config.filters.min_history_bars.max(warmup_bars());
    if bars.len() < required {
        return Err(SkipReason::InsufficientHistory {
            required,
            available: bars.len(),
        });
    }

    let table = compute_indicators(bars);
    let row = table.last().ok_or(SkipReason::InsufficientHistory {
        required,
        available: 0,
    })?;
    let class = classifier.classify(&row)?;

    let px = row.close();
    let risk = &config.risk;
    let levels = find_support_resistance(bars, config.levels.window, config.levels.num_levels);

    let stop = stop_price(px, class.atr, risk.stop_atr_mult);
    let target = target_price(px, stop, class.atr, TargetMode::from(class.setup), risk);
    let (stop, target) = if risk.snap_to_levels {
        snap_to_levels(stop, target, px, class.atr, &levels)
    } else {
        (stop, target)
    };
    let plan = TradePlan::from_levels(px, stop, target, risk);

    let score = smart_score(&ScoreInputs {
        setup: class.setup,
        rsi: class.rsi,
        band: class.band,
        ema_uptrend: class.ema_uptrend,
        sector_aligned: ctx.sector_alignment(symbol),
    });

    Ok(ScanRecord {
        symbol: symbol.to_string(),
        sector: ctx.sector_of(symbol).map(str::to_string),
        row,
        setup: class.setup,
        near_miss: class.near_miss,
        trend: class.trend,
        context: class.context_label(&classifier.near_miss),
        smart_score: score,
        atr: class.atr,
        plan,
        levels,
        gaps: detect_gaps(bars, config.gaps.min_gap_pct, config.gaps.lookback),
        patterns: detect_patterns(bars, &config.patterns),
    })
}
