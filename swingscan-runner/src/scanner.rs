//! Universe scans on a bounded worker pool.
//!
//! Symbols are evaluated in batches on a private rayon pool (never the
//! global one). Between batches the scanner pauses, checks the cancel flag,
//! and stops early once enough hits are collected.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use swingscan_core::scan::evaluate_with;
use swingscan_core::{ConfigError, ScanConfig, ScanContext, ScanRecord, SkipReason};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data_loader::{BarSource, LoadError};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid scan config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A symbol that loaded fine but produced no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

/// A symbol whose bars could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSymbol {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Confirmed setups first, then near-misses; SmartScore descending within each.
    pub records: Vec<ScanRecord>,
    pub skipped: Vec<SkippedSymbol>,
    pub failed: Vec<FailedSymbol>,
    /// Symbols evaluated before the scan finished or stopped.
    pub scanned: usize,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn confirmed(&self) -> impl Iterator<Item = &ScanRecord> {
        self.records.iter().filter(|r| r.is_confirmed())
    }

    pub fn near_misses(&self) -> impl Iterator<Item = &ScanRecord> {
        self.records.iter().filter(|r| !r.is_confirmed())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Confirmed before near-miss, then SmartScore descending, then symbol.
pub fn rank_records(records: &mut [ScanRecord]) {
    records.sort_by(|a, b| {
        b.is_confirmed()
            .cmp(&a.is_confirmed())
            .then_with(|| b.smart_score.total_cmp(&a.smart_score))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

enum Outcome {
    Hit(ScanRecord),
    Skipped(SkipReason),
    Failed(LoadError),
}

pub struct Scanner {
    config: ScanConfig,
    pool: rayon::ThreadPool,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.runner.workers.max(1))
            .thread_name(|i| format!("swingscan-worker-{i}"))
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `symbols` (duplicates ignored) with bars from `source`.
    pub fn run(
        &self,
        source: &dyn BarSource,
        symbols: &[String],
        ctx: &ScanContext,
        cancel: Option<&AtomicBool>,
    ) -> ScanReport {
        let runner = &self.config.runner;
        let classifier = self.config.classifier(&ctx.market);

        let mut seen = HashSet::new();
        let unique: Vec<&str> = symbols
            .iter()
            .map(String::as_str)
            .filter(|s| seen.insert(*s))
            .collect();

        let batch_size = runner.batch_size.max(1);
        let batch_count = unique.len().div_ceil(batch_size);
        let mut report = ScanReport::default();

        info!(
            symbols = unique.len(),
            batches = batch_count,
            workers = runner.workers,
            source = source.name(),
            "scan started"
        );

        for (index, batch) in unique.chunks(batch_size).enumerate() {
            if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                info!(scanned = report.scanned, "scan cancelled");
                report.cancelled = true;
                break;
            }
            if index > 0 && runner.batch_pause_ms > 0 {
                std::thread::sleep(Duration::from_millis(runner.batch_pause_ms));
            }

            let outcomes: Vec<(&str, Outcome)> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|&symbol| {
                        let outcome = match source.load(symbol) {
                            Ok(bars) => {
                                match evaluate_with(&classifier, symbol, &bars, &self.config, ctx)
                                {
                                    Ok(record) => Outcome::Hit(record),
                                    Err(reason) => Outcome::Skipped(reason),
                                }
                            }
                            Err(e) => Outcome::Failed(e),
                        };
                        (symbol, outcome)
                    })
                    .collect()
            });

            let mut hits = 0;
            for (symbol, outcome) in outcomes {
                report.scanned += 1;
                match outcome {
                    Outcome::Hit(record) => {
                        hits += 1;
                        report.records.push(record);
                    }
                    Outcome::Skipped(reason) => {
                        debug!(symbol, %reason, "skipped");
                        report.skipped.push(SkippedSymbol {
                            symbol: symbol.to_string(),
                            reason,
                        });
                    }
                    Outcome::Failed(e) => {
                        warn!(symbol, error = %e, "load failed");
                        report.failed.push(FailedSymbol {
                            symbol: symbol.to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            info!(
                batch = index + 1,
                of = batch_count,
                hits,
                total_hits = report.records.len(),
                "batch complete"
            );

            if report.records.len() >= runner.max_results {
                info!(max_results = runner.max_results, "result limit reached");
                break;
            }
        }

        rank_records(&mut report.records);
        report.records.truncate(runner.max_results);
        report.skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        report.failed.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        info!(
            confirmed = report.confirmed().count(),
            near_misses = report.near_misses().count(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "scan finished"
        );
        report
    }
}
