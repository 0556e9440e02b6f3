//! SwingScan Runner: bar sources, universe files, parallel scans, trade book.
//!
//! This crate builds on `swingscan-core` to provide:
//! - Bar loading from CSV directories with a deterministic synthetic fallback
//! - Sector-organized universe files
//! - Batched universe scans on a private worker pool
//! - An append-only trade book with live price refresh

pub mod data_loader;
pub mod scanner;
pub mod trade_book;
pub mod universe;

pub use data_loader::{
    generate_synthetic_bars, BarSource, CsvDirectory, FallbackSource, LoadError, SyntheticSource,
};
pub use scanner::{rank_records, FailedSymbol, ScanError, ScanReport, Scanner, SkippedSymbol};
pub use trade_book::{QuoteSource, RefreshSummary, TradeBook, TradeBookError};
pub use universe::{Universe, UniverseError};
