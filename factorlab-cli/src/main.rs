//! FactorLab CLI: run backtests, compute factors, generate market data.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config and save its artifacts
//! - `factor`: compute a factor table from a market CSV
//! - `synth`: write a deterministic synthetic market CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use factorlab_core::factors::total_return_index;
use factorlab_runner::data_loader::{
    generate_synthetic_records, load_market_csv, write_market_records, write_wide_csv,
};
use factorlab_runner::{
    compute_factor, run_backtest, save_artifacts, BacktestConfig, BacktestResult, FactorKind,
    FactorParams, LoadOptions,
};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "factorlab",
    about = "FactorLab CLI: long/short factor portfolio simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Use the config's [data.synthetic] section instead of the market file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Output directory for artifacts. Defaults to the config's [output] dir.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Compute a factor over the total-return index of a market CSV.
    Factor {
        /// Long-format market CSV.
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum)]
        kind: FactorArg,

        /// Lookback in rows.
        #[arg(long)]
        lag: usize,

        /// Most recent rows skipped (momentum only).
        #[arg(long, default_value_t = 0)]
        exclude: usize,

        /// Emit raw values instead of expanding z-scores.
        #[arg(long, default_value_t = false)]
        no_norm: bool,

        /// Clip to expanding 5% / 95% quantiles.
        #[arg(long, default_value_t = false)]
        winsorize: bool,

        /// Treat a split ratio of 0 as "no split".
        #[arg(long, default_value_t = false)]
        zero_split_is_none: bool,

        /// Output wide CSV.
        #[arg(long)]
        output: PathBuf,
    },
    /// Write a synthetic long-format market CSV.
    Synth {
        #[arg(long, required = true, num_args = 1..)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,

        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FactorArg {
    Momentum,
    MeanReversion,
    Volatility,
}

impl From<FactorArg> for FactorKind {
    fn from(arg: FactorArg) -> Self {
        match arg {
            FactorArg::Momentum => FactorKind::Momentum,
            FactorArg::MeanReversion => FactorKind::MeanReversion,
            FactorArg::Volatility => FactorKind::Volatility,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            synthetic,
            output_dir,
        } => run_backtest_cmd(config, synthetic, output_dir),
        Commands::Factor {
            input,
            kind,
            lag,
            exclude,
            no_norm,
            winsorize,
            zero_split_is_none,
            output,
        } => {
            let params = FactorParams {
                kind: kind.into(),
                lag,
                exclude,
                norm: !no_norm,
                winsorize,
            };
            run_factor_cmd(input, params, zero_split_is_none, output)
        }
        Commands::Synth {
            symbols,
            start,
            end,
            output,
        } => run_synth_cmd(symbols, start, end, output),
    }
}

fn run_backtest_cmd(
    config_path: PathBuf,
    synthetic: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)?;
    let result = run_backtest(&config, synthetic)?;

    print_summary(&result);

    let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_factor_cmd(
    input: PathBuf,
    params: FactorParams,
    zero_split_is_none: bool,
    output: PathBuf,
) -> Result<()> {
    let market = load_market_csv(&input, LoadOptions { zero_split_is_none })?;
    let scores = compute_factor(&params, &total_return_index(&market))?;

    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_wide_csv(BufWriter::new(file), &scores)?;
    info!(
        "{} (lag {}): {} dates x {} symbols written to {}",
        params.kind,
        params.lag,
        scores.n_rows(),
        scores.n_cols(),
        output.display()
    );
    Ok(())
}

fn run_synth_cmd(
    symbols: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
    output: PathBuf,
) -> Result<()> {
    if end < start {
        bail!("--end {end} is before --start {start}");
    }
    let records: Vec<_> = symbols
        .iter()
        .flat_map(|s| generate_synthetic_records(s, start, end))
        .collect();

    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_market_records(BufWriter::new(file), &records)?;
    info!(
        "wrote {} synthetic records for {} symbols to {}",
        records.len(),
        symbols.len(),
        output.display()
    );
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    let diag = result.diagnostics();
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", result.run_id);
    if let (Some(start), Some(end)) = (result.start_date(), result.end_date()) {
        println!("Period:         {start} to {end}");
    }
    println!(
        "Universe:       {} symbols",
        result.simulation.positions.n_cols()
    );
    println!("Days:           {}", m.trading_days);
    println!("Rebalances:     {}", diag.rebalance_count);
    println!();
    println!("--- Performance ---");
    println!("Initial Value:  {:.2}", m.initial_value);
    println!("Final Value:    {:.2}", m.final_value);
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("CAGR:           {:.2}%", m.cagr * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Min Cash:       {:.2}", m.min_cash);
    if result.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    if !diag.clamped.is_empty() {
        println!(
            "WARNING: {} allocations clamped to 0 (zero or missing close)",
            diag.clamped.len()
        );
    }
    if diag.negative_cash_days > 0 {
        println!("NOTE: cash was negative on {} days", diag.negative_cash_days);
    }
}
