//! Open and closed trades with live price refresh.
//!
//! Trades are never deleted: closing one records the exit and keeps it in
//! the book.

use serde::{Deserialize, Serialize};
use swingscan_core::domain::PriceBar;
use swingscan_core::plan::{AlertLevels, PortfolioSummary, TradePlan};
use swingscan_core::{ScanContext, Trade};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data_loader::{BarSource, LoadError};

#[derive(Debug, Error)]
pub enum TradeBookError {
    #[error("no trade with id {0}")]
    UnknownTrade(usize),

    #[error("trade {0} is already closed")]
    AlreadyClosed(usize),

    #[error("invalid exit price {0}")]
    InvalidExit(f64),
}

/// Live prices for trade refresh.
pub trait QuoteSource {
    fn quote(&self, symbol: &str) -> Result<f64, LoadError>;

    /// Recent intraday bars, when the source has them.
    fn intraday(&self, _symbol: &str) -> Option<Vec<PriceBar>> {
        None
    }
}

/// Any bar source quotes the last daily close.
impl<S: BarSource> QuoteSource for S {
    fn quote(&self, symbol: &str) -> Result<f64, LoadError> {
        let bars = self.load(symbol)?;
        bars.last()
            .map(|b| b.close)
            .ok_or_else(|| LoadError::Invalid {
                symbol: symbol.to_string(),
                source: swingscan_core::CoreError::EmptySeries,
            })
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub updated: usize,
    pub failed: Vec<String>,
    /// Context refresh counter after this cycle.
    pub refresh: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeBook {
    trades: Vec<Trade>,
}

impl TradeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trade and return its id.
    pub fn add(&mut self, trade: Trade) -> usize {
        self.trades.push(trade);
        self.trades.len() - 1
    }

    /// Open a trade at the plan's entry, stop, target and size.
    pub fn open_from_plan(&mut self, symbol: &str, plan: &TradePlan) -> usize {
        self.add(Trade::open(
            symbol,
            plan.entry,
            plan.stop,
            plan.target,
            plan.shares,
        ))
    }

    pub fn close(&mut self, id: usize, exit_price: f64) -> Result<(), TradeBookError> {
        if !(exit_price.is_finite() && exit_price > 0.0) {
            return Err(TradeBookError::InvalidExit(exit_price));
        }
        let trade = self
            .trades
            .get_mut(id)
            .ok_or(TradeBookError::UnknownTrade(id))?;
        if !trade.is_open() {
            return Err(TradeBookError::AlreadyClosed(id));
        }
        trade.close(exit_price);
        info!(id, symbol = %trade.symbol, exit_price, "trade closed");
        Ok(())
    }

    pub fn get(&self, id: usize) -> Option<&Trade> {
        self.trades.get(id)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn open_trades(&self) -> impl Iterator<Item = (usize, &Trade)> {
        self.trades.iter().enumerate().filter(|(_, t)| t.is_open())
    }

    /// Pull a fresh price for every open trade and cache intraday signals.
    ///
    /// A failed quote leaves that trade's last price untouched.
    pub fn refresh(&mut self, quotes: &dyn QuoteSource, ctx: &mut ScanContext) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for trade in self.trades.iter_mut().filter(|t| t.is_open()) {
            match quotes.quote(&trade.symbol) {
                Ok(price) => {
                    trade.update_price(price);
                    summary.updated += 1;
                }
                Err(e) => {
                    warn!(symbol = %trade.symbol, error = %e, "quote failed");
                    summary.failed.push(trade.symbol.clone());
                    continue;
                }
            }

            if let Some(bars) = quotes.intraday(&trade.symbol) {
                if let Err(e) = ctx.cache_intraday(&trade.symbol, bars) {
                    debug!(symbol = %trade.symbol, error = %e, "intraday signals unavailable");
                }
            }
        }

        summary.refresh = ctx.bump_refresh();
        info!(
            updated = summary.updated,
            failed = summary.failed.len(),
            refresh = summary.refresh,
            "trades refreshed"
        );
        summary
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary::from_trades(&self.trades)
    }

    pub fn alerts(&self) -> Vec<(usize, AlertLevels)> {
        self.open_trades()
            .map(|(id, t)| (id, AlertLevels::suggest(t)))
            .collect()
    }
}
