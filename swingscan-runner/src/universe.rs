//! Universe file: sector-organized ticker lists.
//!
//! ```toml
//! [sectors]
//! Technology = ["AAPL", "MSFT"]
//! Energy = ["XOM", "CVX"]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use swingscan_core::ScanContext;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize universe: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Tickers are trimmed and upper-cased; blanks are dropped.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let mut universe: Self = toml::from_str(content)?;
        for tickers in universe.sectors.values_mut() {
            *tickers = tickers
                .iter()
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
        Ok(universe)
    }

    pub fn to_toml(&self) -> Result<String, UniverseError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Every ticker once, sorted. A ticker listed under two sectors keeps
    /// the first sector in name order.
    pub fn all_tickers(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self
            .sectors
            .values()
            .flat_map(|tickers| tickers.iter().map(String::as_str))
            .collect();
        unique.into_iter().map(String::from).collect()
    }

    pub fn sector_tickers(&self, sector: &str) -> Option<&[String]> {
        self.sectors.get(sector).map(Vec::as_slice)
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.keys().map(String::as_str).collect()
    }

    pub fn ticker_count(&self) -> usize {
        self.all_tickers().len()
    }

    /// Register every ticker's sector with the scan context.
    pub fn apply_to(&self, ctx: &mut ScanContext) {
        // Reverse name order so the first sector wins for duplicated tickers.
        for (sector, tickers) in self.sectors.iter().rev() {
            ctx.assign_sector(sector, tickers.iter().map(String::as_str));
        }
    }

    /// A small US large-cap universe for demos and synthetic scans.
    pub fn default_us() -> Self {
        let sector = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut sectors = BTreeMap::new();
        sectors.insert(
            "Information Technology".into(),
            sector(&["AAPL", "MSFT", "NVDA", "AVGO", "CRM", "ADBE", "ORCL", "AMD"]),
        );
        sectors.insert(
            "Health Care".into(),
            sector(&["JNJ", "UNH", "PFE", "ABBV", "MRK", "LLY", "TMO", "ABT"]),
        );
        sectors.insert(
            "Financials".into(),
            sector(&["JPM", "BAC", "WFC", "GS", "MS", "BLK", "SCHW", "AXP"]),
        );
        sectors.insert(
            "Energy".into(),
            sector(&["XOM", "CVX", "COP", "SLB", "EOG", "MPC", "PSX", "VLO"]),
        );
        sectors.insert(
            "Consumer Staples".into(),
            sector(&["WMT", "PG", "KO", "PEP", "COST", "MDLZ", "CL", "KMB"]),
        );
        sectors.insert(
            "Industrials".into(),
            sector(&["CAT", "DE", "HON", "GE", "UNP", "LMT", "RTX", "ETN"]),
        );
        Self { sectors }
    }
}
