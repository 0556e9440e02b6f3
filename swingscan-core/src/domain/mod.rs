//! Domain types shared by every stage of the scan pipeline.

pub mod bar;
pub mod trade;

pub use bar::{validate_bars, PriceBar};
pub use trade::{Trade, TradeStatus};
