//! siglab core — price/signal series, backtest engine, accuracy scorer, fold iterators.
//!
//! This crate is pure computation:
//! - Domain types (bars, price series, signal points and series, trades)
//! - Event-driven backtest with per-leg transaction costs
//! - Directional accuracy of signals against forward returns
//! - Purged k-fold and anchored walk-forward index ranges
//! - Caller-owned strategy registry
//!
//! No I/O, no global state. Every entry point owns its working state, so calls
//! on independent inputs can run concurrently.

pub mod accuracy;
pub mod backtest;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod sampling;
pub mod strategy;

pub use accuracy::{compute_accuracy, AccuracyResult, BySide, SideStats};
pub use backtest::{cost_rate, run_backtest, run_backtest_sparse, BacktestResult};
pub use domain::{
    Bar, Position, PriceSeries, SignalMetadata, SignalPoint, SignalSeries, Trade, TradeSide,
};
pub use error::{ConfigError, DataError, EngineError};
pub use sampling::{
    purged_kfold, walk_forward_anchored, FoldRanges, PurgedKFold, WalkForwardAnchored,
};
pub use strategy::{MeanReversion, SignalStrategy, StrategyRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine inputs, outputs and errors are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<SignalSeries>();
        require_sync::<SignalSeries>();
        require_send::<BacktestResult>();
        require_sync::<BacktestResult>();
        require_send::<AccuracyResult>();
        require_sync::<AccuracyResult>();
        require_send::<EngineError>();
        require_sync::<EngineError>();
        require_send::<PurgedKFold>();
        require_sync::<PurgedKFold>();
        require_send::<WalkForwardAnchored>();
        require_sync::<WalkForwardAnchored>();
        require_send::<StrategyRegistry>();
        require_sync::<StrategyRegistry>();
    }

    #[test]
    fn engine_runs_on_independent_threads() {
        let handles: Vec<_> = (0..4)
            .map(|k| {
                std::thread::spawn(move || {
                    let bars = (0..50)
                        .map(|i| Bar {
                            timestamp: i,
                            open: 100.0 + (i * k) as f64,
                            high: 100.0 + (i * k) as f64,
                            low: 100.0 + (i * k) as f64,
                            close: 100.0 + (i * k) as f64,
                            volume: 1.0,
                        })
                        .collect();
                    let prices = PriceSeries::new(bars).unwrap();
                    let signals = vec![Position::Long; prices.len()];
                    run_backtest(&prices, &signals, 1.0, 1.0).unwrap()
                })
            })
            .collect();
        for handle in handles {
            let result = handle.join().unwrap();
            assert_eq!(result.equity_curve.len(), 50);
            assert_eq!(result.n_trades, 1);
        }
    }
}
