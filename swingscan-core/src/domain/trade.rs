//! Trade: a manually planned position tracked across price refreshes.

use serde::{Deserialize, Serialize};

use crate::plan::{trade_metrics, TradeMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Closed,
}

/// A planned or open position.
///
/// Trades are never deleted: closing flips `status` and records the exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub shares: u64,
    pub status: TradeStatus,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub exit_price: Option<f64>,
}

impl Trade {
    pub fn open(symbol: impl Into<String>, entry: f64, stop: f64, target: f64, shares: u64) -> Self {
        Self {
            symbol: symbol.into(),
            entry,
            stop,
            target,
            shares,
            status: TradeStatus::Open,
            last_price: None,
            exit_price: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Record a fresh quote. Closed trades keep their final price.
    pub fn update_price(&mut self, price: f64) {
        if self.is_open() && price.is_finite() && price > 0.0 {
            self.last_price = Some(price);
        }
    }

    /// Close the trade at `exit_price`. The last price is pinned to the exit.
    pub fn close(&mut self, exit_price: f64) {
        self.status = TradeStatus::Closed;
        self.exit_price = Some(exit_price);
        self.last_price = Some(exit_price);
    }

    pub fn metrics(&self) -> TradeMetrics {
        trade_metrics(self)
    }
}
