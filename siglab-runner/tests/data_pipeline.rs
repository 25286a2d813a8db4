//! Integration tests for the runner's data pipeline.
//!
//! Writes CSV and TOML fixtures into a temp directory and drives them through
//! config loading, CSV parsing and a full evaluation.

use std::path::Path;

use siglab_core::{MeanReversion, Position, StrategyRegistry};
use siglab_runner::config::{ConfigError, EvalConfig, SignalSource};
use siglab_runner::data_loader::{load_prices, load_signals, LoadError};
use siglab_runner::runner::{run_from_config, RunError};

const PRICES: &str = "\
ts,open,high,low,close,volume,rsi
1000,100,100,100,100,5,25
2000,101,101,101,101,5,50
3000,99,99,99,99,5,75
4000,99,99,99,99,5,50
5000,102,102,102,102,5,20
";

const SIGNALS: &str = "\
ts,signal,score
1000,0,
2000,1,0.7
3000,1,0.6
4000,0,
5000,-1,0.9
";

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn config_toml(source_line: &str) -> String {
    format!(
        r#"
[dataset]
market = "crypto"
symbol = "BTCUSDT"
timeframe = "1h"
prices = "prices.csv"
{source_line}

[costs]
fee_bps = 10.0
slippage_bps = 5.0

[accuracy]
horizon_bars = 1
"#
    )
}

#[test]
fn config_paths_resolve_against_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "eval.toml", &config_toml("signals = \"signals.csv\""));

    let config = EvalConfig::from_file(&dir.path().join("eval.toml")).unwrap();
    assert_eq!(config.dataset.prices, dir.path().join("prices.csv"));
    assert_eq!(
        config.signal_source().unwrap(),
        SignalSource::File(dir.path().join("signals.csv"))
    );
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EvalConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn csv_files_load_with_features_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prices.csv", PRICES);
    write(dir.path(), "signals.csv", SIGNALS);

    let px = load_prices(&dir.path().join("prices.csv")).unwrap();
    assert_eq!(px.len(), 5);
    assert_eq!(px.feature("rsi").unwrap(), &[25.0, 50.0, 75.0, 50.0, 20.0]);

    let sig = load_signals(&dir.path().join("signals.csv")).unwrap();
    assert_eq!(sig.len(), 5);
    assert_eq!(sig.metadata().len(), 3);
    assert_eq!(sig.metadata_at(5000).unwrap()["score"], 0.9);
}

#[test]
fn missing_price_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_prices(&dir.path().join("missing.csv")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn file_signals_evaluate_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prices.csv", PRICES);
    write(dir.path(), "signals.csv", SIGNALS);
    write(dir.path(), "eval.toml", &config_toml("signals = \"signals.csv\""));

    let config = EvalConfig::from_file(&dir.path().join("eval.toml")).unwrap();
    let report = run_from_config(&config, &StrategyRegistry::with_builtins()).unwrap();

    assert_eq!(report.bar_count, 5);
    assert_eq!(report.backtest.n_trades, 2);
    assert_eq!(report.backtest.equity_curve.len(), 5);
    // long@101 → 99 miss, long@99 → 99 miss, short@102 has no forward bar
    assert_eq!(report.accuracy.samples, 2);
    assert_eq!(report.accuracy.hits, 0);
    assert!(!report.synthetic);
}

#[test]
fn strategy_signals_evaluate_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prices.csv", PRICES);
    write(
        dir.path(),
        "eval.toml",
        &config_toml(&format!("strategy = \"{}\"", MeanReversion::NAME)),
    );

    let config = EvalConfig::from_file(&dir.path().join("eval.toml")).unwrap();
    let report = run_from_config(&config, &StrategyRegistry::with_builtins()).unwrap();
    // rsi [25,50,75,50,20] → raw [1,0,-1,0,1] → shifted [0,1,0,-1,0]
    assert_eq!(report.signal_count, 5);
    assert_eq!(report.backtest.n_trades, 2);
    assert_eq!(report.backtest.trades[0].timestamp, 2000);
    assert_eq!(
        report.backtest.trades[1].side,
        siglab_core::TradeSide::opening(Position::Short).unwrap()
    );
}

#[test]
fn unknown_strategy_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prices.csv", PRICES);
    write(dir.path(), "eval.toml", &config_toml("strategy = \"momentum\""));

    let config = EvalConfig::from_file(&dir.path().join("eval.toml")).unwrap();
    let err = run_from_config(&config, &StrategyRegistry::with_builtins()).unwrap_err();
    assert!(matches!(err, RunError::Engine(_)));
}
