//! End-to-end scans over a temporary directory of CSV files.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use chrono::NaiveDate;
use swingscan_core::domain::PriceBar;
use swingscan_core::setup::SetupKind;
use swingscan_core::{MarketContext, ScanConfig, ScanContext, SkipReason};
use swingscan_runner::{CsvDirectory, Scanner, TradeBook, Universe};

fn series(n: usize, start: f64, step: f64, volume: f64) -> Vec<PriceBar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let wiggle = if i % 2 == 0 { 0.4 } else { -0.4 };
            let close = start + step * i as f64 + wiggle;
            PriceBar::new(
                base + chrono::Duration::days(i as i64),
                close - 0.1,
                close + 0.6,
                close - 0.6,
                close,
                volume,
            )
        })
        .collect()
}

const UNIVERSE: &str = r#"
[sectors]
"Information Technology" = ["UP", "GHOST"]
Energy = ["DOWN", "BROKEN"]
Materials = ["PENNY"]
"#;

fn fixture_dir(dir: &Path) -> CsvDirectory {
    let csv = CsvDirectory::new(dir.join("bars"));
    csv.write("UP", &series(121, 50.0, 0.3, 1_000_000.0)).unwrap();
    csv.write("DOWN", &series(121, 120.0, -0.3, 1_000_000.0)).unwrap();
    csv.write("PENNY", &series(121, 1.0, 0.01, 1_000_000.0)).unwrap();

    let mut broken = series(80, 40.0, 0.1, 1_000_000.0);
    broken[30].high = broken[30].low - 1.0;
    csv.write("BROKEN", &broken).unwrap();

    std::fs::write(dir.join("universe.toml"), UNIVERSE).unwrap();
    csv
}

fn config() -> ScanConfig {
    let mut config = ScanConfig::default();
    config.runner.workers = 2;
    config.runner.batch_size = 2;
    config.runner.batch_pause_ms = 0;
    config
}

fn context(universe: &Universe, favored: &[&str]) -> ScanContext {
    let mut ctx = ScanContext::new().with_market(MarketContext {
        bias: None,
        favored_sectors: favored.iter().map(|s| s.to_string()).collect(),
    });
    universe.apply_to(&mut ctx);
    ctx
}

#[test]
fn scan_buckets_hits_skips_and_failures() {
    let dir = tempfile::tempdir().unwrap();
    let csv = fixture_dir(dir.path());
    let universe = Universe::from_file(&dir.path().join("universe.toml")).unwrap();

    let scanner = Scanner::new(config()).unwrap();
    let report = scanner.run(
        &csv,
        &universe.all_tickers(),
        &context(&universe, &[]),
        None,
    );

    assert_eq!(report.scanned, 5);
    assert!(!report.cancelled);

    assert_eq!(report.records.len(), 1);
    let up = &report.records[0];
    assert_eq!(up.symbol, "UP");
    assert_eq!(up.setup, SetupKind::Breakout);
    assert_eq!(up.sector.as_deref(), Some("Information Technology"));
    assert!(up.plan.stop < up.plan.entry);
    assert!(up.plan.target > up.plan.entry);
    assert!(up.plan.shares > 0);

    let skipped: Vec<_> = report.skipped.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(skipped, ["DOWN", "PENNY"]);
    assert_eq!(report.skipped[0].reason, SkipReason::NoSignal);
    assert!(matches!(
        report.skipped[1].reason,
        SkipReason::PriceOutOfRange { .. }
    ));

    let failed: Vec<_> = report.failed.iter().map(|f| f.symbol.as_str()).collect();
    assert_eq!(failed, ["BROKEN", "GHOST"]);
}

#[test]
fn favored_sector_raises_smart_score() {
    let dir = tempfile::tempdir().unwrap();
    let csv = fixture_dir(dir.path());
    let universe = Universe::from_toml(UNIVERSE).unwrap();
    let scanner = Scanner::new(config()).unwrap();
    let symbols = vec!["UP".to_string()];

    let score = |favored: &[&str]| {
        scanner
            .run(&csv, &symbols, &context(&universe, favored), None)
            .records[0]
            .smart_score
    };

    let neutral = score(&[]);
    let favored = score(&["technology"]);
    let unfavored = score(&["utilities"]);
    assert!(favored > neutral || favored == 100.0);
    assert!(unfavored < neutral);
}

#[test]
fn report_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let csv = fixture_dir(dir.path());
    let scanner = Scanner::new(config()).unwrap();
    let report = scanner.run(
        &csv,
        &["UP".to_string(), "PENNY".to_string()],
        &ScanContext::new(),
        None,
    );

    let json = report.to_json().unwrap();
    assert!(json.contains("\"symbol\": \"UP\""));
    assert!(json.contains("price_out_of_range"));
}

#[test]
fn result_limit_stops_scan_early() {
    let dir = tempfile::tempdir().unwrap();
    let csv = CsvDirectory::new(dir.path());
    let names: Vec<String> = (0..6).map(|i| format!("UP{i}")).collect();
    for (i, name) in names.iter().enumerate() {
        csv.write(name, &series(121, 40.0 + i as f64, 0.3, 1_000_000.0))
            .unwrap();
    }

    let mut config = config();
    config.runner.max_results = 3;
    let scanner = Scanner::new(config).unwrap();
    let report = scanner.run(&csv, &names, &ScanContext::new(), Some(&AtomicBool::new(false)));

    // Two batches of two reach the limit; the third batch never runs.
    assert_eq!(report.scanned, 4);
    assert_eq!(report.records.len(), 3);
}

#[test]
fn trade_book_refreshes_from_csv_closes() {
    let dir = tempfile::tempdir().unwrap();
    let csv = fixture_dir(dir.path());
    let scanner = Scanner::new(config()).unwrap();
    let report = scanner.run(&csv, &["UP".to_string()], &ScanContext::new(), None);
    let record = &report.records[0];

    let mut book = TradeBook::new();
    let id = book.open_from_plan(&record.symbol, &record.plan);
    let mut ctx = ScanContext::new();
    let summary = book.refresh(&csv, &mut ctx);

    assert_eq!(summary.updated, 1);
    assert_eq!(ctx.refresh_counter, 1);
    let trade = book.get(id).unwrap();
    assert_eq!(trade.last_price, Some(record.price()));
    assert_eq!(trade.metrics().unrealized_r, Some(0.0));
}
