//! Heartbeat CLI: run and sweep commands.
//!
//! Commands:
//! - `run`: execute one session from a TOML config file
//! - `sweep`: run a moving average crossover grid in parallel

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use heartbeat_core::BacktestReport;
use heartbeat_runner::{
    load_feed, run_backtest, run_sweep, sweep_grid, BacktestConfig, RunOptions, SweepResult,
};

#[derive(Parser)]
#[command(
    name = "heartbeat",
    about = "Heartbeat: event-driven backtesting engine"
)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a session from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Use this many synthetic bars per symbol instead of CSV files.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Output directory (overrides `[output] directory`).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Sweep moving average windows over the same data.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Short windows, comma separated (e.g. 5,10,20).
        #[arg(long, value_delimiter = ',', required = true)]
        short: Vec<usize>,

        /// Long windows, comma separated (e.g. 50,100).
        #[arg(long, value_delimiter = ',', required = true)]
        long: Vec<usize>,

        /// Use this many synthetic bars per symbol instead of CSV files.
        #[arg(long)]
        synthetic: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            synthetic,
            output_dir,
            json,
        } => run_cmd(config, synthetic, output_dir, json),
        Commands::Sweep {
            config,
            short,
            long,
            synthetic,
        } => sweep_cmd(config, short, long, synthetic),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_cmd(
    config_path: PathBuf,
    synthetic: Option<usize>,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let opts = RunOptions {
        synthetic_bars: synthetic,
        output_dir,
    };

    let report = run_backtest(&config, &opts).context("backtest failed")?;

    if json {
        let text = serde_json::to_string_pretty(&report).context("encoding report")?;
        println!("{text}");
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn sweep_cmd(
    config_path: PathBuf,
    shorts: Vec<usize>,
    longs: Vec<usize>,
    synthetic: Option<usize>,
) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let points = sweep_grid(&shorts, &longs);
    if points.is_empty() {
        bail!("no valid (short, long) pairs: every short window must be below a long window");
    }

    let feed = load_feed(&config, synthetic).context("loading bars")?;
    info!(points = points.len(), bars = feed.len(), "starting sweep");
    let results = run_sweep(&config, &feed, &points).context("sweep failed")?;
    print_sweep_table(&results);
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    let stats = report.stats_report();
    println!();
    println!("=== {} on {} ===", report.strategy, report.symbols.join(", "));
    println!("  Total Return:      {}", stats.total_return);
    match stats.sharpe_ratio {
        Some(sharpe) => println!("  Sharpe Ratio:      {sharpe:.4}"),
        None => println!("  Sharpe Ratio:      n/a"),
    }
    println!("  Max Drawdown:      {}", stats.max_drawdown);
    println!("  Drawdown Duration: {}", stats.drawdown_duration);
    println!(
        "  Final Equity:      {:.2} (from {:.2})",
        report.final_total, report.initial_capital
    );
    println!(
        "  Events:            {} market, {} signals, {} orders, {} fills",
        report.counters.market_events,
        report.counters.signals,
        report.counters.orders,
        report.counters.fills
    );
}

fn print_sweep_table(results: &[SweepResult]) {
    println!(
        "{:>6} {:>6} {:>10} {:>12} {:>12} {:>6}",
        "short", "long", "sharpe", "return", "max_dd", "fills"
    );
    for r in results {
        println!(
            "{:>6} {:>6} {:>10.4} {:>11.2}% {:>11.2}% {:>6}",
            r.point.short_window,
            r.point.long_window,
            r.stats.sharpe_ratio,
            r.stats.total_return * 100.0,
            r.stats.max_drawdown * 100.0,
            r.counters.fills
        );
    }
}
