//! SwingScan CLI: scan, analyze and plan commands.
//!
//! Commands:
//! - `scan`: classify a universe of symbols and list setups and near-misses
//! - `analyze`: full breakdown of one symbol (indicators, levels, gaps, patterns, plan)
//! - `plan`: stop, target and size for an entry and ATR, with live trade
//!   metrics when a last price is given

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use swingscan_core::plan::{AlertLevels, RiskParams, TargetMode, TradePlan};
use swingscan_core::scan::evaluate_symbol;
use swingscan_core::setup::{classify_setup, ScanMode, Sensitivity, Trend};
use swingscan_core::table::compute_indicators;
use swingscan_core::{MarketContext, ScanConfig, ScanContext, ScanRecord, Trade};
use swingscan_runner::{
    BarSource, CsvDirectory, FallbackSource, ScanReport, Scanner, SyntheticSource, Universe,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Trading days of synthetic history generated per symbol.
const SYNTHETIC_DAYS: usize = 300;

#[derive(Parser)]
#[command(
    name = "swingscan",
    version,
    about = "Swing-trading setup scanner"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where daily bars come from.
#[derive(Args)]
struct SourceArgs {
    /// Directory of `<SYMBOL>.csv` files (Date,Open,High,Low,Close,Volume).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Generate deterministic synthetic bars for symbols without data.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Last session of synthetic data (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,
}

/// Scan settings that override the config file.
#[derive(Args)]
struct ScanArgs {
    /// Path to a TOML scan config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Threshold sensitivity, 1 (strict) to 5 (loose).
    #[arg(long)]
    sensitivity: Option<u8>,

    /// pullback, breakout or both.
    #[arg(long)]
    mode: Option<ScanMode>,

    /// Broad-market trend (uptrend, downtrend, sideways) for smart scans.
    #[arg(long)]
    market_bias: Option<Trend>,

    /// Sector names that earn the SmartScore sector bonus (repeatable).
    #[arg(long = "favor")]
    favored_sectors: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a universe and list confirmed setups and near-misses.
    Scan {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        scan: ScanArgs,

        /// Universe TOML with a [sectors] table. Defaults to a built-in US list.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Scan only these symbols instead of the whole universe.
        #[arg(long, num_args = 1..)]
        symbols: Vec<String>,

        /// Print the full report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show everything the engine derives for one symbol.
    Analyze {
        symbol: String,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        scan: ScanArgs,

        /// Universe TOML used for the symbol's sector. Defaults to a built-in US list.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Print the scan record as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Compute a trade plan from an entry price and ATR.
    Plan {
        #[arg(long)]
        entry: f64,

        #[arg(long)]
        atr: f64,

        /// bounce (pullback) or expansion (breakout).
        #[arg(long, default_value = "bounce")]
        target_mode: TargetMode,

        #[arg(long, default_value_t = 10_000.0)]
        account: f64,

        /// Percent of the account risked.
        #[arg(long, default_value_t = 1.0)]
        risk_pct: f64,

        #[arg(long, default_value_t = 2.0)]
        stop_mult: f64,

        #[arg(long, default_value_t = 2.0)]
        rr: f64,

        /// Current price; prints R-multiple, progress and alert levels.
        #[arg(long)]
        last: Option<f64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swingscan=info,swingscan_runner=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            source,
            scan,
            universe,
            symbols,
            json,
        } => run_scan(&source, &scan, universe.as_deref(), symbols, json),
        Commands::Analyze {
            symbol,
            source,
            scan,
            universe,
            json,
        } => run_analyze(&symbol, &source, &scan, universe.as_deref(), json),
        Commands::Plan {
            entry,
            atr,
            target_mode,
            account,
            risk_pct,
            stop_mult,
            rr,
            last,
        } => {
            let params = RiskParams {
                stop_atr_mult: stop_mult,
                rr_mult: rr,
                account_size: account,
                risk_pct,
                snap_to_levels: false,
            };
            run_plan(entry, atr, target_mode, &params, last)
        }
    }
}

fn build_source(args: &SourceArgs) -> Result<Box<dyn BarSource>> {
    let end = args
        .end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--end must be YYYY-MM-DD")?
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let synthetic = SyntheticSource::ending_at(end, SYNTHETIC_DAYS);

    let source: Box<dyn BarSource> = match (&args.data_dir, args.synthetic) {
        (Some(dir), false) => Box::new(CsvDirectory::new(dir)),
        (Some(dir), true) => Box::new(FallbackSource::new(CsvDirectory::new(dir), synthetic)),
        (None, true) => {
            eprintln!("WARNING: using SYNTHETIC data; results are not market signals");
            Box::new(synthetic)
        }
        (None, false) => bail!("one of --data-dir or --synthetic is required"),
    };
    Ok(source)
}

fn build_config(args: &ScanArgs) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if let Some(level) = args.sensitivity {
        config.scan.sensitivity = Sensitivity::new(level)?;
    }
    if let Some(mode) = args.mode {
        config.scan.mode = mode;
    }
    Ok(config)
}

fn build_context(args: &ScanArgs, universe: Option<&Universe>) -> ScanContext {
    let mut ctx = ScanContext::new().with_market(MarketContext {
        bias: args.market_bias,
        favored_sectors: args.favored_sectors.clone(),
    });
    if let Some(u) = universe {
        u.apply_to(&mut ctx);
    }
    ctx
}

fn load_universe(path: Option<&Path>) -> Result<Universe> {
    match path {
        Some(path) => Universe::from_file(path)
            .with_context(|| format!("loading universe {}", path.display())),
        None => Ok(Universe::default_us()),
    }
}

fn run_scan(
    source_args: &SourceArgs,
    scan_args: &ScanArgs,
    universe_path: Option<&Path>,
    symbols: Vec<String>,
    json: bool,
) -> Result<()> {
    let source = build_source(source_args)?;
    let config = build_config(scan_args)?;
    let universe = load_universe(universe_path)?;
    let symbols = if symbols.is_empty() {
        universe.all_tickers()
    } else {
        symbols.iter().map(|s| s.trim().to_uppercase()).collect()
    };
    if symbols.is_empty() {
        bail!("no symbols to scan");
    }

    let ctx = build_context(scan_args, Some(&universe));
    let scanner = Scanner::new(config)?;
    let report = scanner.run(source.as_ref(), &symbols, &ctx, None);

    if json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report, scanner.config());
    }
    Ok(())
}

fn print_report(report: &ScanReport, config: &ScanConfig) {
    println!();
    println!(
        "=== Scan: sensitivity {}, mode {:?} ===",
        config.scan.sensitivity.level(),
        config.scan.mode
    );
    println!(
        "Scanned: {}   Confirmed: {}   Near-miss: {}   Skipped: {}   Failed: {}",
        report.scanned,
        report.confirmed().count(),
        report.near_misses().count(),
        report.skipped.len(),
        report.failed.len()
    );
    if report.cancelled {
        println!("(scan cancelled)");
    }

    println!();
    println!(
        "{:<8} {:<9} {:>6} {:>9} {:>9} {:>9} {:>7}  Context",
        "Symbol", "Setup", "Score", "Price", "Stop", "Target", "Shares"
    );
    for r in &report.records {
        println!(
            "{:<8} {:<9} {:>6.1} {:>9.2} {:>9.2} {:>9.2} {:>7}  {}",
            r.symbol,
            r.setup.to_string(),
            r.smart_score,
            r.price(),
            r.plan.stop,
            r.plan.target,
            r.plan.shares,
            r.context
        );
    }

    if !report.failed.is_empty() {
        println!();
        println!("--- Failed ---");
        for f in &report.failed {
            println!("{:<8} {}", f.symbol, f.error);
        }
    }
}

fn run_analyze(
    symbol: &str,
    source_args: &SourceArgs,
    scan_args: &ScanArgs,
    universe_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let symbol = symbol.trim().to_uppercase();
    let source = build_source(source_args)?;
    let config = build_config(scan_args)?;
    let universe = load_universe(universe_path)?;
    let ctx = build_context(scan_args, Some(&universe));

    let bars = source
        .load(&symbol)
        .with_context(|| format!("loading bars for {symbol}"))?;

    match evaluate_symbol(&symbol, &bars, &config, &ctx) {
        Ok(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
        Ok(record) => print_record(&record),
        Err(reason) => {
            let table = compute_indicators(&bars);
            if json {
                let row = table.last();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "symbol": symbol,
                        "skipped": reason,
                        "row": row,
                    }))?
                );
                return Ok(());
            }
            println!();
            println!("=== {symbol} ===");
            println!("No setup: {reason}");
            if let Some(row) = table.last() {
                println!("Loose read:     {:?}", classify_setup(&row));
                print_row(&row);
            }
        }
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn print_row(row: &swingscan_core::IndicatorRow) {
    println!();
    println!("--- Indicators ({}) ---", row.bar.date);
    println!("Close:          {:.2}", row.close());
    println!("EMA20 / EMA50:  {} / {}", fmt_opt(row.ema20), fmt_opt(row.ema50));
    println!("RSI14:          {}", fmt_opt(row.rsi14));
    println!("ATR14:          {}", fmt_opt(row.atr14));
    println!("BandPos20:      {}", fmt_opt(row.bandpos20));
    println!("HH20 / LL20:    {} / {}", fmt_opt(row.hh20), fmt_opt(row.ll20));
    println!("AvgVol20:       {}", fmt_opt(row.avgvol20));
    println!("RelVolume:      {}", fmt_opt(row.relvolume));
}

fn print_record(r: &ScanRecord) {
    println!();
    println!("=== {} ===", r.symbol);
    if let Some(sector) = &r.sector {
        println!("Sector:         {sector}");
    }
    println!("Setup:          {}", r.context);
    println!("SmartScore:     {:.1}", r.smart_score);
    print_row(&r.row);

    println!();
    println!("--- Plan ---");
    println!("Entry:          {:.2}", r.plan.entry);
    println!("Stop:           {:.2}", r.plan.stop);
    println!("Target:         {:.2}", r.plan.target);
    println!("Shares:         {}", r.plan.shares);
    println!("R:R:            {}", fmt_opt(r.plan.rr));

    println!();
    println!("--- Levels ---");
    println!("Support:        {:?}", r.levels.support);
    println!("Resistance:     {:?}", r.levels.resistance);
    for gap in r.gaps.gap_ups.iter().chain(&r.gaps.gap_downs) {
        println!(
            "Gap {:?} {}:  {:.2} to {:.2} ({:.1}%)",
            gap.kind, gap.date, gap.gap_low, gap.gap_high, gap.size_pct
        );
    }

    if !r.patterns.is_empty() {
        println!();
        println!("--- Patterns ---");
        for p in &r.patterns {
            println!("{} ({}%, {:?}): {}", p.kind, p.confidence, p.bias, p.description);
            println!("    {}", p.action);
        }
    }
}

fn run_plan(
    entry: f64,
    atr: f64,
    mode: TargetMode,
    params: &RiskParams,
    last: Option<f64>,
) -> Result<()> {
    if !(entry > 0.0 && atr > 0.0) {
        bail!("--entry and --atr must be positive");
    }
    let plan = TradePlan::build(entry, atr, mode, params);
    print_plan(&plan, params);

    if let Some(last) = last {
        let mut trade = Trade::open("PLAN", plan.entry, plan.stop, plan.target, plan.shares);
        trade.update_price(last);
        print_trade(&trade);
    }
    Ok(())
}

fn print_plan(plan: &TradePlan, params: &RiskParams) {
    println!();
    println!("=== Trade Plan ===");
    println!("Entry:          {:.2}", plan.entry);
    println!("Stop:           {:.2}", plan.stop);
    println!("Target:         {:.2}", plan.target);
    println!("Risk/share:     {:.2}", plan.risk_per_share);
    println!("Reward/share:   {:.2}", plan.reward_per_share);
    println!("R:R:            {}", fmt_opt(plan.rr));
    println!(
        "Shares:         {} (risking {:.2} of {:.2})",
        plan.shares,
        plan.position_risk(),
        params.account_size
    );
}

fn print_trade(trade: &Trade) {
    let m = trade.metrics();
    println!();
    println!("--- At {} ---", fmt_opt(trade.last_price));
    println!("R-multiple:     {}", fmt_opt(m.unrealized_r));
    println!(
        "To target:      {}",
        m.progress_to_target
            .map_or_else(|| "-".to_string(), |p| format!("{:.0}%", p * 100.0))
    );
    println!(
        "Above stop:     {}",
        m.distance_from_stop
            .map_or_else(|| "-".to_string(), |d| format!("{:.0}%", d * 100.0))
    );
    print_alerts(&AlertLevels::suggest(trade));
}

fn print_alerts(a: &AlertLevels) {
    println!(
        "Alerts:         breakout {:.2}  stop watch {:.2}  target near {:.2}  momentum {} / {}",
        a.breakout_entry,
        a.stop_watch,
        a.target_near,
        fmt_opt(a.momentum_up),
        fmt_opt(a.momentum_down)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_accepts_a_universe_file() {
        let cli = Cli::try_parse_from([
            "swingscan",
            "analyze",
            "ZZZ",
            "--synthetic",
            "--universe",
            "mine.toml",
            "--favor",
            "Utilities",
        ])
        .unwrap();
        let Commands::Analyze { universe, scan, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(universe.as_deref(), Some(Path::new("mine.toml")));
        assert_eq!(scan.favored_sectors, vec!["Utilities".to_string()]);
    }

    #[test]
    fn custom_universe_aligns_favored_sector() {
        let cli = Cli::try_parse_from(["swingscan", "analyze", "ZZZ", "--favor", "Utilities"])
            .unwrap();
        let Commands::Analyze { scan, .. } = cli.command else {
            panic!("expected analyze");
        };
        let universe = Universe::from_toml("[sectors]\nUtilities = [\"ZZZ\"]\n").unwrap();
        let ctx = build_context(&scan, Some(&universe));
        assert_eq!(ctx.sector_of("ZZZ"), Some("Utilities"));
        assert_eq!(ctx.sector_alignment("ZZZ"), Some(true));

        let ctx = build_context(&scan, Some(&load_universe(None).unwrap()));
        assert_eq!(ctx.sector_of("ZZZ"), None);
    }
}
