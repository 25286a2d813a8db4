//! Evaluation runner — wires loading, engine, validation and result sinks.
//!
//! Entry points:
//! - `run_from_config()`: loads prices and signals per an `EvalConfig`, then evaluates.
//!   The CLI calls `resolve_signals()` and `evaluate()` itself so it keeps the prices for artifacts.
//! - `evaluate()`: takes pre-loaded series. No I/O.
//! - `persist()`: upserts the report's backtest and accuracy into a `ResultStore`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use siglab_core::{
    compute_accuracy, run_backtest_sparse, AccuracyResult, BacktestResult, EngineError,
    PriceSeries, SignalSeries, StrategyRegistry,
};

use crate::config::{ConfigError, EvalConfig, SignalSource};
use crate::data_loader::{dataset_hash, load_prices, load_signals, LoadError};
use crate::store::{AccuracyKey, BacktestKey, RecordId, ResultStore, SeriesKey, StoreError};
use crate::validation::{run_validation, ValidationPlan, ValidationReport};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Engine parameters for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalParams {
    pub fee_bps: f64,
    pub slippage_bps: f64,
    pub horizon_bars: usize,
    #[serde(default)]
    pub validation: Option<ValidationPlan>,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            fee_bps: 10.0,
            slippage_bps: 5.0,
            horizon_bars: 24,
            validation: None,
        }
    }
}

impl EvalParams {
    pub fn from_config(config: &EvalConfig) -> Self {
        Self {
            fee_bps: config.costs.fee_bps,
            slippage_bps: config.costs.slippage_bps,
            horizon_bars: config.accuracy.horizon_bars,
            validation: config.validation,
        }
    }
}

/// Full result of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub key: SeriesKey,
    pub dataset_hash: String,
    pub bar_count: usize,
    pub signal_count: usize,
    /// True when prices came from the synthetic generator.
    #[serde(default)]
    pub synthetic: bool,
    pub params: EvalParams,
    pub backtest: BacktestResult,
    pub accuracy: AccuracyResult,
    #[serde(default)]
    pub validation: Option<ValidationReport>,
    /// RFC 3339 UTC timestamp.
    pub generated_at: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl EvaluationReport {
    pub fn accuracy_key(&self) -> AccuracyKey {
        AccuracyKey {
            series: self.key.clone(),
            horizon_bars: self.params.horizon_bars,
        }
    }

    pub fn backtest_key(&self) -> BacktestKey {
        BacktestKey {
            series: self.key.clone(),
            fee_bps: self.params.fee_bps,
            slippage_bps: self.params.slippage_bps,
        }
    }
}

/// Record ids returned by [`persist`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedIds {
    pub backtest: RecordId,
    pub accuracy: RecordId,
}

/// Evaluate pre-loaded series. No I/O.
pub fn evaluate(
    key: SeriesKey,
    prices: &PriceSeries,
    signals: &SignalSeries,
    params: EvalParams,
    synthetic: bool,
) -> Result<EvaluationReport, RunError> {
    info!(
        series = %key,
        bars = prices.len(),
        signals = signals.len(),
        "evaluation started"
    );

    let backtest = run_backtest_sparse(prices, signals, params.fee_bps, params.slippage_bps)?;
    let accuracy = compute_accuracy(prices, signals, params.horizon_bars)?;
    let validation = params
        .validation
        .map(|plan| {
            run_validation(
                prices,
                signals,
                plan,
                params.fee_bps,
                params.slippage_bps,
                params.horizon_bars,
            )
        })
        .transpose()?;

    info!(
        series = %key,
        pnl = backtest.total_pnl,
        max_drawdown = backtest.max_drawdown,
        trades = backtest.n_trades,
        accuracy = accuracy.accuracy,
        samples = accuracy.samples,
        folds = validation.as_ref().map_or(0, |v| v.folds.len()),
        "evaluation finished"
    );

    Ok(EvaluationReport {
        schema_version: SCHEMA_VERSION,
        key,
        dataset_hash: dataset_hash(prices),
        bar_count: prices.len(),
        signal_count: signals.len(),
        synthetic,
        params,
        backtest,
        accuracy,
        validation,
        generated_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Resolve the signals for `prices` from the configured source.
pub fn resolve_signals(
    config: &EvalConfig,
    prices: &PriceSeries,
    registry: &StrategyRegistry,
) -> Result<SignalSeries, RunError> {
    match config.signal_source()? {
        SignalSource::File(path) => Ok(load_signals(&path)?),
        SignalSource::Strategy(name) => {
            info!(strategy = %name, "generating signals");
            Ok(registry.generate(&name, prices)?)
        }
    }
}

/// Load data per `config` and evaluate it.
pub fn run_from_config(
    config: &EvalConfig,
    registry: &StrategyRegistry,
) -> Result<EvaluationReport, RunError> {
    config.validate()?;
    let prices = load_prices(&config.dataset.prices)?;
    let signals = resolve_signals(config, &prices, registry)?;
    evaluate(
        config.series_key(),
        &prices,
        &signals,
        EvalParams::from_config(config),
        false,
    )
}

/// Upsert the report's backtest and accuracy results.
pub fn persist(
    report: &EvaluationReport,
    store: &dyn ResultStore,
) -> Result<PersistedIds, StoreError> {
    let backtest = store.upsert_backtest(&report.backtest_key(), &report.backtest)?;
    let accuracy = store.upsert_accuracy(&report.accuracy_key(), &report.accuracy)?;
    info!(backtest = %backtest, accuracy = %accuracy, "results persisted");
    Ok(PersistedIds { backtest, accuracy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglab_core::{Bar, Position, SignalPoint};

    fn key() -> SeriesKey {
        SeriesKey {
            tenant: "default".into(),
            market: "crypto".into(),
            symbol: "BTCUSDT".into(),
            timeframe: "1h".into(),
        }
    }

    fn prices(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: i as i64 * 1000,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn sparse_signals_evaluated_against_price_index() {
        let px = prices(&[100.0, 101.0, 102.0, 103.0]);
        let sig = SignalSeries::new(vec![SignalPoint::new(1000, Position::Long)]).unwrap();
        let params = EvalParams {
            fee_bps: 0.0,
            slippage_bps: 0.0,
            horizon_bars: 1,
            validation: None,
        };
        let report = evaluate(key(), &px, &sig, params, false).unwrap();
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.bar_count, 4);
        assert_eq!(report.signal_count, 1);
        // sparse point at bar 1 only; bars 2 and 3 are flat
        assert_eq!(report.backtest.n_trades, 1);
        assert_eq!(report.accuracy.samples, 1);
        assert_eq!(report.accuracy.hits, 1);
        assert!(report.validation.is_none());
    }

    #[test]
    fn zero_horizon_is_an_engine_error() {
        let px = prices(&[100.0, 101.0]);
        let params = EvalParams {
            horizon_bars: 0,
            ..EvalParams::default()
        };
        let err = evaluate(key(), &px, &SignalSeries::default(), params, false).unwrap_err();
        assert!(matches!(err, RunError::Engine(EngineError::Config(_))));
    }

    #[test]
    fn report_keys_follow_params() {
        let px = prices(&[100.0, 101.0]);
        let report =
            evaluate(key(), &px, &SignalSeries::default(), EvalParams::default(), true).unwrap();
        assert!(report.synthetic);
        assert_eq!(report.accuracy_key().horizon_bars, 24);
        assert_eq!(report.backtest_key().fee_bps, 10.0);
        assert_eq!(report.backtest_key().slippage_bps, 5.0);
    }
}
