//! siglab CLI — evaluate trading signals against price series.
//!
//! Commands:
//! - `run` — full evaluation from a TOML config (backtest, accuracy, optional validation)
//! - `backtest` — event-driven backtest of a price/signal pair
//! - `accuracy` — directional hit rate of signals at a forward horizon
//! - `folds` — print purged k-fold or anchored walk-forward index ranges
//! - `strategies` — list built-in signal strategies

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use siglab_core::{
    compute_accuracy, purged_kfold, run_backtest_sparse, walk_forward_anchored, AccuracyResult,
    BacktestResult, FoldRanges, PriceSeries, SignalSeries, StrategyRegistry,
};
use siglab_runner::runner::{evaluate, persist, resolve_signals, EvalParams, EvaluationReport};
use siglab_runner::{
    load_prices, load_signals, save_artifacts, synthetic_prices, EvalConfig, JsonDirStore,
};

#[derive(Parser)]
#[command(name = "siglab", about = "siglab — signal backtesting and accuracy evaluation")]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full evaluation from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for report.json, equity.csv and trades.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Upsert results into a JSON directory store.
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },
    /// Backtest a price/signal pair.
    Backtest {
        #[command(flatten)]
        inputs: Inputs,

        /// Fee per leg in basis points.
        #[arg(long, default_value_t = 10.0)]
        fee_bps: f64,

        /// Slippage per leg in basis points.
        #[arg(long, default_value_t = 5.0)]
        slippage_bps: f64,

        /// Print the full result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Score signal direction against forward returns.
    Accuracy {
        #[command(flatten)]
        inputs: Inputs,

        /// Forward horizon in bars.
        #[arg(long, default_value_t = 24)]
        horizon: usize,

        /// Print the full result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print train/test index ranges.
    Folds {
        #[command(subcommand)]
        mode: FoldMode,
    },
    /// List registered strategies.
    Strategies,
}

#[derive(Subcommand)]
enum FoldMode {
    /// Contiguous test folds with a purge gap before each.
    PurgedKfold {
        /// Number of bars.
        #[arg(long)]
        bars: usize,
        #[arg(long, default_value_t = 5)]
        k: usize,
        #[arg(long, default_value_t = 20)]
        purge: usize,
    },
    /// Expanding train window, fixed-size test window.
    WalkForward {
        /// Number of bars.
        #[arg(long)]
        bars: usize,
        #[arg(long, default_value_t = 500)]
        window: usize,
        #[arg(long, default_value_t = 100)]
        step: usize,
    },
}

/// Price and signal sources shared by `backtest` and `accuracy`.
#[derive(Args)]
struct Inputs {
    /// Price CSV (ts,open,high,low,close,volume[,features...]).
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Use this many seeded synthetic bars instead of a price file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed for --synthetic.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Signal CSV (ts,signal[,metadata...]).
    #[arg(long)]
    signals: Option<PathBuf>,

    /// Generate signals with a registered strategy.
    #[arg(long)]
    strategy: Option<String>,
}

impl Inputs {
    fn load(&self, registry: &StrategyRegistry) -> Result<(PriceSeries, SignalSeries)> {
        let prices = match (&self.prices, self.synthetic) {
            (Some(_), Some(_)) => bail!("--prices and --synthetic are mutually exclusive"),
            (None, None) => bail!("one of --prices or --synthetic is required"),
            (Some(path), None) => load_prices(path)
                .with_context(|| format!("failed to load prices from {}", path.display()))?,
            (None, Some(n)) => synthetic_prices(n, self.seed, 0, 60_000)?,
        };

        let signals = match (&self.signals, &self.strategy) {
            (Some(_), Some(_)) => bail!("--signals and --strategy are mutually exclusive"),
            (None, None) => bail!("one of --signals or --strategy is required"),
            (Some(path), None) => load_signals(path)
                .with_context(|| format!("failed to load signals from {}", path.display()))?,
            (None, Some(name)) => registry.generate(name, &prices)?,
        };
        Ok((prices, signals))
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose {
        "debug,siglab_core=debug,siglab_runner=debug"
    } else {
        "info,siglab_core=info,siglab_runner=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let registry = StrategyRegistry::with_builtins();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            store_dir,
        } => run_cmd(config, output_dir, store_dir, &registry),
        Commands::Backtest {
            inputs,
            fee_bps,
            slippage_bps,
            json,
        } => backtest_cmd(&inputs, fee_bps, slippage_bps, json, &registry),
        Commands::Accuracy {
            inputs,
            horizon,
            json,
        } => accuracy_cmd(&inputs, horizon, json, &registry),
        Commands::Folds { mode } => folds_cmd(mode),
        Commands::Strategies => {
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn run_cmd(
    config_path: PathBuf,
    output_dir: PathBuf,
    store_dir: Option<PathBuf>,
    registry: &StrategyRegistry,
) -> Result<()> {
    let config = EvalConfig::from_file(&config_path)?;
    let prices = load_prices(&config.dataset.prices).with_context(|| {
        format!(
            "failed to load prices from {}",
            config.dataset.prices.display()
        )
    })?;
    let signals = resolve_signals(&config, &prices, registry)?;
    let report = evaluate(
        config.series_key(),
        &prices,
        &signals,
        EvalParams::from_config(&config),
        false,
    )?;

    print_report(&report);

    let paths = save_artifacts(&output_dir, &report, &prices)?;
    println!("Artifacts saved to: {}", output_dir.display());
    info!(report = %paths.report.display(), "report written");

    if let Some(dir) = store_dir {
        let ids = persist(&report, &JsonDirStore::new(&dir))?;
        println!("Stored backtest {} and accuracy {}", ids.backtest, ids.accuracy);
    }
    Ok(())
}

fn backtest_cmd(
    inputs: &Inputs,
    fee_bps: f64,
    slippage_bps: f64,
    json: bool,
    registry: &StrategyRegistry,
) -> Result<()> {
    let (prices, signals) = inputs.load(registry)?;
    let result = run_backtest_sparse(&prices, &signals, fee_bps, slippage_bps)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_backtest(&result, prices.len());
        if inputs.synthetic.is_some() {
            println!();
            println!("WARNING: Results based on SYNTHETIC data");
        }
    }
    Ok(())
}

fn accuracy_cmd(
    inputs: &Inputs,
    horizon: usize,
    json: bool,
    registry: &StrategyRegistry,
) -> Result<()> {
    let (prices, signals) = inputs.load(registry)?;
    let result = compute_accuracy(&prices, &signals, horizon)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_accuracy(&result, horizon);
    }
    Ok(())
}

fn folds_cmd(mode: FoldMode) -> Result<()> {
    let folds: Vec<FoldRanges> = match mode {
        FoldMode::PurgedKfold { bars, k, purge } => purged_kfold(bars, k, purge)?.iter().collect(),
        FoldMode::WalkForward { bars, window, step } => {
            walk_forward_anchored(bars, window, step)?.iter().collect()
        }
    };
    println!("{:<6} {:>16} {:>16}", "fold", "train", "test");
    for (i, fold) in folds.iter().enumerate() {
        println!(
            "{:<6} {:>16} {:>16}",
            i,
            format!("[{}, {})", fold.train.start, fold.train.end),
            format!("[{}, {})", fold.test.start, fold.test.end),
        );
    }
    Ok(())
}

// ─── Printing ───────────────────────────────────────────────────────

fn print_backtest(result: &BacktestResult, bars: usize) {
    println!();
    println!("=== Backtest Result ===");
    println!("Bars:           {bars}");
    println!("Trades:         {}", result.n_trades);
    println!("Total PnL:      {:.4}%", result.total_pnl * 100.0);
    println!("Max Drawdown:   {:.4}%", result.max_drawdown * 100.0);
    if let Some(last) = result.equity_curve.last() {
        println!("Final Equity:   {last:.6}");
    }
}

fn print_accuracy(result: &AccuracyResult, horizon: usize) {
    println!();
    println!("=== Accuracy (h = {horizon} bars) ===");
    println!("Samples:        {}", result.samples);
    println!("Hits:           {}", result.hits);
    println!("Accuracy:       {:.2}%", result.accuracy * 100.0);
    println!(
        "Long:           {}/{} ({:.2}%)",
        result.by_side.long.hits,
        result.by_side.long.n,
        result.by_side.long.accuracy() * 100.0
    );
    println!(
        "Short:          {}/{} ({:.2}%)",
        result.by_side.short.hits,
        result.by_side.short.n,
        result.by_side.short.accuracy() * 100.0
    );
}

fn print_report(report: &EvaluationReport) {
    println!();
    println!("=== Evaluation: {} ===", report.key);
    println!("Bars:           {}", report.bar_count);
    println!("Signals:        {}", report.signal_count);
    println!(
        "Dataset:        {}",
        report.dataset_hash.get(..16).unwrap_or(&report.dataset_hash)
    );
    print_backtest(&report.backtest, report.bar_count);
    print_accuracy(&report.accuracy, report.params.horizon_bars);

    if let Some(validation) = &report.validation {
        println!();
        println!("--- Validation ({} folds) ---", validation.folds.len());
        for fold in &validation.folds {
            println!(
                "fold {:<3} test [{}, {})  pnl {:>9.4}%  dd {:>8.4}%  acc {:>6.2}% ({} samples)",
                fold.fold_index,
                fold.test.start,
                fold.test.end,
                fold.test_backtest.total_pnl * 100.0,
                fold.test_backtest.max_drawdown * 100.0,
                fold.test_accuracy.accuracy * 100.0,
                fold.test_accuracy.samples,
            );
        }
        println!("Mean Test PnL:  {:.4}%", validation.mean_test_pnl * 100.0);
        println!("Worst Test DD:  {:.4}%", validation.worst_test_drawdown * 100.0);
        println!(
            "Pooled Acc:     {:.2}%",
            validation.pooled_test_accuracy * 100.0
        );
        println!("Test Trades:    {}", validation.total_test_trades);
    }
    if report.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}
