//! SwingScan Core: technical indicators, support/resistance, chart patterns,
//! setup classification and trade-plan math for swing-trading scans.
//!
//! Pipeline:
//! bars → [`table::compute_indicators`] → {[`levels`], [`patterns`], [`setup`]}
//! → [`scan::ScanRecord`].
//!
//! Everything here is synchronous and free of shared mutable state, so a
//! runner can evaluate symbols on as many threads as it likes.

pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod intraday;
pub mod levels;
pub mod patterns;
pub mod plan;
pub mod scan;
pub mod setup;
pub mod table;

pub use config::{ConfigError, ScanConfig};
pub use context::{MarketContext, ScanContext};
pub use domain::{PriceBar, Trade, TradeStatus};
pub use error::{CoreError, SkipReason};
pub use scan::{evaluate_symbol, ScanRecord};
pub use table::{compute_indicators, IndicatorRow, IndicatorTable};
