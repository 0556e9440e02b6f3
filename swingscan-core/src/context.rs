//! Caller-owned scan state.
//!
//! Scans borrow the context immutably and can share it across worker
//! threads. Trade refreshes borrow it mutably to update caches and the
//! refresh counter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::error::CoreError;
use crate::intraday::IntradaySignals;
use crate::setup::Trend;

/// Broad-market inputs for "smart" scans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Shifts the sensitivity thresholds when set.
    pub bias: Option<Trend>,
    /// Sector names earning the SmartScore sector bonus.
    pub favored_sectors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    pub market: MarketContext,
    sectors: HashMap<String, String>,
    pub intraday_cache: HashMap<String, Vec<PriceBar>>,
    pub metrics_cache: HashMap<String, IntradaySignals>,
    pub refresh_counter: u64,
}

impl ScanContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(mut self, market: MarketContext) -> Self {
        self.market = market;
        self
    }

    /// Record the sector for each symbol in `symbols`.
    pub fn assign_sector<'a>(&mut self, sector: &str, symbols: impl IntoIterator<Item = &'a str>) {
        for symbol in symbols {
            self.sectors.insert(symbol.to_string(), sector.to_string());
        }
    }

    pub fn sector_of(&self, symbol: &str) -> Option<&str> {
        self.sectors.get(symbol).map(String::as_str)
    }

    /// `None` when no favored sectors were supplied, otherwise whether the
    /// symbol's sector name contains any favored name (case-insensitive).
    pub fn sector_alignment(&self, symbol: &str) -> Option<bool> {
        if self.market.favored_sectors.is_empty() {
            return None;
        }
        let sector = self.sector_of(symbol).unwrap_or_default().to_lowercase();
        Some(
            self.market
                .favored_sectors
                .iter()
                .any(|f| !f.is_empty() && sector.contains(&f.to_lowercase())),
        )
    }

    /// Store intraday bars for `symbol` and cache the signals derived from them.
    pub fn cache_intraday(
        &mut self,
        symbol: &str,
        bars: Vec<PriceBar>,
    ) -> Result<IntradaySignals, CoreError> {
        let signals = IntradaySignals::compute(&bars);
        self.intraday_cache.insert(symbol.to_string(), bars);
        match signals {
            Ok(s) => {
                self.metrics_cache.insert(symbol.to_string(), s);
                Ok(s)
            }
            Err(e) => {
                self.metrics_cache.remove(symbol);
                Err(e)
            }
        }
    }

    pub fn signals(&self, symbol: &str) -> Option<&IntradaySignals> {
        self.metrics_cache.get(symbol)
    }

    /// Count one refresh cycle and return the new total.
    pub fn bump_refresh(&mut self) -> u64 {
        self.refresh_counter += 1;
        self.refresh_counter
    }

    pub fn clear_caches(&mut self) {
        self.intraday_cache.clear();
        self.metrics_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn with_favored(favored: &[&str]) -> ScanContext {
        let mut ctx = ScanContext::new().with_market(MarketContext {
            bias: None,
            favored_sectors: favored.iter().map(|s| s.to_string()).collect(),
        });
        ctx.assign_sector("Information Technology", ["AAPL", "MSFT"]);
        ctx.assign_sector("Energy", ["XOM"]);
        ctx
    }

    #[test]
    fn no_favored_sectors_means_no_alignment() {
        assert_eq!(with_favored(&[]).sector_alignment("AAPL"), None);
    }

    #[test]
    fn alignment_is_case_insensitive_substring() {
        let ctx = with_favored(&["technology"]);
        assert_eq!(ctx.sector_alignment("AAPL"), Some(true));
        assert_eq!(ctx.sector_alignment("XOM"), Some(false));
        assert_eq!(ctx.sector_alignment("UNKNOWN"), Some(false));
    }

    #[test]
    fn cache_intraday_stores_bars_and_signals() {
        let mut ctx = ScanContext::new();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.1).collect();
        let signals = ctx.cache_intraday("AAPL", make_bars(&closes)).unwrap();
        assert_eq!(ctx.intraday_cache["AAPL"].len(), 60);
        assert_eq!(ctx.signals("AAPL"), Some(&signals));
    }

    #[test]
    fn failed_intraday_clears_stale_signals() {
        let mut ctx = ScanContext::new();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.1).collect();
        ctx.cache_intraday("AAPL", make_bars(&closes)).unwrap();
        assert!(ctx.cache_intraday("AAPL", make_bars(&[100.0; 5])).is_err());
        assert!(ctx.signals("AAPL").is_none());
        assert_eq!(ctx.intraday_cache["AAPL"].len(), 5);
    }

    #[test]
    fn refresh_counter_increments() {
        let mut ctx = ScanContext::new();
        assert_eq!(ctx.bump_refresh(), 1);
        assert_eq!(ctx.bump_refresh(), 2);
        ctx.clear_caches();
        assert_eq!(ctx.refresh_counter, 2);
    }
}
