//! Bar sources for the scanner.
//!
//! The engine only ever sees validated `PriceBar` slices. Where they come
//! from is behind [`BarSource`]:
//! 1. [`CsvDirectory`] reads `<dir>/<SYMBOL>.csv` exports
//! 2. [`SyntheticSource`] generates a deterministic random walk per symbol
//! 3. [`FallbackSource`] tries a primary source and falls back to synthetic
//!    bars when the symbol has no data file
//!
//! Synthetic data is a developer-only mode for running scans offline.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use swingscan_core::domain::{validate_bars, PriceBar};
use swingscan_core::CoreError;
use thiserror::Error;
use tracing::warn;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no bar data for '{symbol}' (looked for {})", path.display())]
    NotFound { symbol: String, path: PathBuf },

    #[error("csv error for '{symbol}': {source}")]
    Csv {
        symbol: String,
        #[source]
        source: csv::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bars for '{symbol}': {source}")]
    Invalid {
        symbol: String,
        #[source]
        source: CoreError,
    },
}

/// Anything that can produce a daily bar history for a symbol.
pub trait BarSource: Send + Sync {
    fn name(&self) -> &str;

    /// Bars in ascending date order, already validated.
    fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError>;
}

impl<S: BarSource + ?Sized> BarSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
        (**self).load(symbol)
    }
}

/// One CSV row. Column names follow common end-of-day exports.
#[derive(Debug, Serialize, Deserialize)]
struct CsvBar {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

impl From<CsvBar> for PriceBar {
    fn from(row: CsvBar) -> Self {
        PriceBar::new(row.date, row.open, row.high, row.low, row.close, row.volume)
    }
}

impl From<&PriceBar> for CsvBar {
    fn from(bar: &PriceBar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// Directory of per-symbol CSV files with a `Date,Open,High,Low,Close,Volume` header.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Symbols with a data file in the directory, sorted.
    pub fn symbols(&self) -> Result<Vec<String>, LoadError> {
        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    /// Write `bars` to `<dir>/<symbol>.csv`, replacing any existing file.
    pub fn write(&self, symbol: &str, bars: &[PriceBar]) -> Result<(), LoadError> {
        std::fs::create_dir_all(&self.dir)?;
        let csv_err = |source| LoadError::Csv {
            symbol: symbol.to_string(),
            source,
        };
        let mut wtr = csv::Writer::from_path(self.path_for(symbol)).map_err(csv_err)?;
        for bar in bars {
            wtr.serialize(CsvBar::from(bar)).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl BarSource for CsvDirectory {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(LoadError::NotFound {
                symbol: symbol.to_string(),
                path,
            });
        }

        let csv_err = |source| LoadError::Csv {
            symbol: symbol.to_string(),
            source,
        };
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(csv_err)?;
        let bars = rdr
            .deserialize::<CsvBar>()
            .map(|row| row.map(PriceBar::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;

        validate_bars(&bars).map_err(|source| LoadError::Invalid {
            symbol: symbol.to_string(),
            source,
        })?;
        Ok(bars)
    }
}

/// Deterministic random-walk bars, seeded from the symbol name.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyntheticSource {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A window of roughly `trading_days` weekdays ending at `end`.
    pub fn ending_at(end: NaiveDate, trading_days: usize) -> Self {
        let calendar_days = (trading_days as i64 * 7 + 4) / 5 + 7;
        Self {
            start: end - chrono::Duration::days(calendar_days),
            end,
        }
    }
}

impl BarSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
        Ok(generate_synthetic_bars(symbol, self.start, self.end))
    }
}

/// Weekday bars from `start` to `end` inclusive.
///
/// Daily returns are drawn from ±2.5% with a small upward drift so some
/// symbols develop trends worth classifying.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price: f64 = rng.gen_range(20.0..250.0);
    let drift: f64 = rng.gen_range(-0.002..0.004);
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = drift + rng.gen_range(-0.025..0.025);
        let open = price * (1.0 + rng.gen_range(-0.005..0.005));
        let close = (price * (1.0 + daily_return)).max(0.5);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(300_000.0..5_000_000.0_f64).round();

        bars.push(PriceBar::new(current, open, high, low, close, volume));

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Primary source with a synthetic fallback for symbols that have no data.
///
/// Only a missing file triggers the fallback; unreadable or invalid data is
/// still an error.
pub struct FallbackSource<P> {
    primary: P,
    synthetic: SyntheticSource,
}

impl<P: BarSource> FallbackSource<P> {
    pub fn new(primary: P, synthetic: SyntheticSource) -> Self {
        Self { primary, synthetic }
    }
}

impl<P: BarSource> BarSource for FallbackSource<P> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn load(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
        match self.primary.load(symbol) {
            Err(LoadError::NotFound { .. }) => {
                warn!(
                    symbol,
                    source = self.primary.name(),
                    "no data found; generating synthetic bars"
                );
                self.synthetic.load(symbol)
            }
            other => other,
        }
    }
}
