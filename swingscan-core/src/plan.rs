//! Trade-plan arithmetic: stops, targets, sizing and R-multiples.
//!
//! Pure functions. Degenerate inputs (zero or negative risk per share)
//! produce 0 shares or `None`, never NaN or a panic.
//!
//! `progress_to_target` and `distance_from_stop` are not clamped: values
//! outside [0, 1] report how far price has run past the target or through
//! the stop.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Trade;
use crate::levels::LevelSet;
use crate::setup::SetupKind;

/// Stops and targets never go below this price.
pub const MIN_PRICE: f64 = 0.01;

/// Snap the stop to support only when support is within this many ATRs.
pub const SUPPORT_SNAP_ATR: f64 = 3.0;
pub const SUPPORT_SNAP_FACTOR: f64 = 0.995;
pub const RESISTANCE_SNAP_FACTOR: f64 = 0.99;

/// How the target is projected from the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    /// Pullback: bounce by `rr_mult` times the actual stop distance.
    Bounce,
    /// Breakout: expand by `rr_mult` times the ATR stop distance.
    Expansion,
}

impl FromStr for TargetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bounce" | "pullback" => Ok(TargetMode::Bounce),
            "expansion" | "breakout" => Ok(TargetMode::Expansion),
            other => Err(format!("unknown target mode: {other}")),
        }
    }
}

impl From<SetupKind> for TargetMode {
    fn from(setup: SetupKind) -> Self {
        match setup {
            SetupKind::Pullback => TargetMode::Bounce,
            _ => TargetMode::Expansion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParams {
    pub stop_atr_mult: f64,
    pub rr_mult: f64,
    pub account_size: f64,
    /// Percent of the account risked per trade.
    pub risk_pct: f64,
    /// Pull stop/target onto nearby support/resistance.
    pub snap_to_levels: bool,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            stop_atr_mult: 2.0,
            rr_mult: 2.0,
            account_size: 10_000.0,
            risk_pct: 1.0,
            snap_to_levels: true,
        }
    }
}

pub fn stop_price(last_close: f64, atr: f64, stop_atr_mult: f64) -> f64 {
    (last_close - stop_atr_mult * atr).max(MIN_PRICE)
}

pub fn target_price(entry: f64, stop: f64, atr: f64, mode: TargetMode, params: &RiskParams) -> f64 {
    let target = match mode {
        TargetMode::Bounce => entry + params.rr_mult * (entry - stop),
        TargetMode::Expansion => entry + params.rr_mult * (params.stop_atr_mult * atr),
    };
    target.max(MIN_PRICE)
}

/// Whole shares risking `risk_pct` of the account. 0 when risk per share is not positive.
pub fn position_size(account_size: f64, risk_pct: f64, entry: f64, stop: f64) -> u64 {
    let risk_per_share = entry - stop;
    if !(risk_per_share > 0.0) {
        return 0;
    }
    let risk_amount = account_size * risk_pct / 100.0;
    if !(risk_amount > 0.0) {
        return 0;
    }
    // `as` saturates; the NaN case is excluded above.
    (risk_amount / risk_per_share).floor() as u64
}

/// (last - entry) / (entry - stop). `None` without positive risk.
pub fn r_multiple(last: f64, entry: f64, stop: f64) -> Option<f64> {
    let risk = entry - stop;
    (risk > 0.0).then(|| (last - entry) / risk)
}

/// 1 - (target - last) / (target - entry). 0 at entry, 1 at target.
pub fn progress_to_target(last: f64, entry: f64, target: f64) -> Option<f64> {
    let span = target - entry;
    (span != 0.0 && span.is_finite()).then(|| 1.0 - (target - last) / span)
}

/// (last - stop) / (entry - stop). 1 at entry, 0 at the stop.
pub fn distance_from_stop(last: f64, entry: f64, stop: f64) -> Option<f64> {
    let span = entry - stop;
    (span != 0.0 && span.is_finite()).then(|| (last - stop) / span)
}

/// Move the stop just under nearby support and cap the target just under
/// the first resistance it would have to cross.
pub fn snap_to_levels(stop: f64, target: f64, price: f64, atr: f64, levels: &LevelSet) -> (f64, f64) {
    let stop = match levels.nearest_support() {
        Some(s) if price - s < SUPPORT_SNAP_ATR * atr => s * SUPPORT_SNAP_FACTOR,
        _ => stop,
    };
    let target = match levels.nearest_resistance() {
        Some(r) if r < target => r * RESISTANCE_SNAP_FACTOR,
        _ => target,
    };
    (stop.max(MIN_PRICE), target.max(MIN_PRICE))
}

/// A complete plan for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub shares: u64,
    pub risk_per_share: f64,
    pub reward_per_share: f64,
    /// Reward over risk. `None` without positive risk.
    pub rr: Option<f64>,
}

impl TradePlan {
    pub fn build(entry: f64, atr: f64, mode: TargetMode, params: &RiskParams) -> Self {
        let stop = stop_price(entry, atr, params.stop_atr_mult);
        let target = target_price(entry, stop, atr, mode, params);
        Self::from_levels(entry, stop, target, params)
    }

    /// Size a plan whose stop and target are already decided.
    pub fn from_levels(entry: f64, stop: f64, target: f64, params: &RiskParams) -> Self {
        let risk_per_share = entry - stop;
        let reward_per_share = target - entry;
        Self {
            entry,
            stop,
            target,
            shares: position_size(params.account_size, params.risk_pct, entry, stop),
            risk_per_share,
            reward_per_share,
            rr: (risk_per_share > 0.0).then(|| reward_per_share / risk_per_share),
        }
    }

    /// Dollar risk at the stop for the sized position.
    pub fn position_risk(&self) -> f64 {
        self.risk_per_share.max(0.0) * self.shares as f64
    }
}

/// Live metrics for one trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeMetrics {
    pub risk_per_share: f64,
    pub reward_per_share: f64,
    pub rr: Option<f64>,
    pub unrealized_r: Option<f64>,
    pub position_risk: f64,
    pub progress_to_target: Option<f64>,
    pub distance_from_stop: Option<f64>,
}

pub fn trade_metrics(trade: &Trade) -> TradeMetrics {
    let risk_per_share = trade.entry - trade.stop;
    let reward_per_share = trade.target - trade.entry;
    let last = trade.last_price;
    TradeMetrics {
        risk_per_share,
        reward_per_share,
        rr: (risk_per_share > 0.0).then(|| reward_per_share / risk_per_share),
        unrealized_r: last.and_then(|p| r_multiple(p, trade.entry, trade.stop)),
        position_risk: risk_per_share.max(0.0) * trade.shares as f64,
        progress_to_target: last.and_then(|p| progress_to_target(p, trade.entry, trade.target)),
        distance_from_stop: last.and_then(|p| distance_from_stop(p, trade.entry, trade.stop)),
    }
}

/// Aggregates over OPEN trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub open_count: usize,
    pub total_risk: f64,
    pub total_unrealized_r: f64,
    /// Mean planned R:R over open trades with a positive R:R.
    pub avg_rr: Option<f64>,
}

impl PortfolioSummary {
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Self {
        let mut summary = Self::default();
        let mut rr_sum = 0.0;
        let mut rr_count = 0usize;

        for trade in trades.into_iter().filter(|t| t.is_open()) {
            let m = trade.metrics();
            summary.open_count += 1;
            summary.total_risk += m.position_risk;
            summary.total_unrealized_r += m.unrealized_r.unwrap_or(0.0);
            if let Some(rr) = m.rr.filter(|&rr| rr > 0.0) {
                rr_sum += rr;
                rr_count += 1;
            }
        }

        summary.avg_rr = (rr_count > 0).then(|| rr_sum / rr_count as f64);
        summary
    }
}

/// Suggested price alerts for an open trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertLevels {
    pub breakout_entry: f64,
    pub stop_watch: f64,
    pub target_near: f64,
    /// Present once the trade has a live price.
    pub momentum_up: Option<f64>,
    pub momentum_down: Option<f64>,
}

impl AlertLevels {
    pub fn suggest(trade: &Trade) -> Self {
        let half_reward = (trade.target - trade.entry).abs() / 2.0;
        let half_risk = (trade.entry - trade.stop).abs() / 2.0;
        Self {
            breakout_entry: trade.entry * 1.01,
            stop_watch: trade.stop * 0.995,
            target_near: trade.target * 0.985,
            momentum_up: trade.last_price.map(|p| p + half_reward),
            momentum_down: trade.last_price.map(|p| p - half_risk),
        }
    }
}
