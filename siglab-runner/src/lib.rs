//! siglab runner — evaluation orchestration around `siglab-core`.
//!
//! This crate provides:
//! - TOML evaluation config with validation
//! - CSV loading for prices (with feature columns) and signals (with metadata)
//! - Single evaluation runner: backtest, accuracy, optional fold validation
//! - Fold-level validation reports (purged k-fold, anchored walk-forward)
//! - Result sinks keyed by composite series/parameter keys
//! - JSON/CSV export and seeded synthetic prices

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod store;
pub mod validation;

pub use config::{ConfigError, EvalConfig, SignalSource};
pub use data_loader::{
    dataset_hash, load_prices, load_signals, read_prices, read_signals, synthetic_prices,
    LoadError,
};
pub use export::{export_equity_csv, export_json, export_trades_csv, import_json, save_artifacts};
pub use runner::{
    evaluate, persist, resolve_signals, run_from_config, EvalParams, EvaluationReport,
    PersistedIds, RunError, SCHEMA_VERSION,
};
pub use store::{
    AccuracyKey, BacktestKey, CompositeKey, JsonDirStore, MemoryStore, RecordId, ResultStore,
    SeriesKey, StoreError,
};
pub use validation::{run_validation, FoldReport, ValidationPlan, ValidationReport};
