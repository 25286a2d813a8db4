//! Fold-level validation — backtest and score each test fold of a plan.
//!
//! The plan produces train/test index ranges (purged k-fold or anchored
//! walk-forward). Each test range is evaluated in isolation: prices and
//! aligned signals are sliced to the fold, so forward returns never reach
//! past the fold's last bar. Folds are independent and run in parallel.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use siglab_core::{
    compute_accuracy, purged_kfold, run_backtest, walk_forward_anchored, AccuracyResult,
    ConfigError, EngineError, FoldRanges, PriceSeries, SignalSeries,
};

// ─── Plan ────────────────────────────────────────────────────────────

/// Fold scheme and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum ValidationPlan {
    #[serde(rename = "purged_kfold")]
    PurgedKFold {
        #[serde(default = "default_k")]
        k: usize,
        #[serde(default = "default_purge")]
        purge: usize,
    },
    #[serde(rename = "walk_forward_anchored")]
    WalkForwardAnchored {
        #[serde(default = "default_window")]
        window: usize,
        #[serde(default = "default_step")]
        step: usize,
    },
}

fn default_k() -> usize {
    5
}

fn default_purge() -> usize {
    20
}

fn default_window() -> usize {
    500
}

fn default_step() -> usize {
    100
}

impl ValidationPlan {
    /// Parameter check independent of the bar count.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.folds(0).map(|_| ())
    }

    /// Materialize the fold ranges for `n_bars`.
    pub fn folds(&self, n_bars: usize) -> Result<Vec<FoldRanges>, ConfigError> {
        Ok(match *self {
            ValidationPlan::PurgedKFold { k, purge } => {
                purged_kfold(n_bars, k, purge)?.iter().collect()
            }
            ValidationPlan::WalkForwardAnchored { window, step } => {
                walk_forward_anchored(n_bars, window, step)?.iter().collect()
            }
        })
    }
}

// ─── Results ─────────────────────────────────────────────────────────

/// Backtest summary for one test fold (the equity curve is not kept).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldBacktest {
    pub total_pnl: f64,
    pub max_drawdown: f64,
    pub n_trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldReport {
    pub fold_index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
    pub test_backtest: FoldBacktest,
    pub test_accuracy: AccuracyResult,
    /// Accuracy over the train range; `None` when it is empty.
    pub train_accuracy: Option<AccuracyResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub plan: ValidationPlan,
    pub folds: Vec<FoldReport>,
    /// Mean of per-fold test pnl; 0.0 with no folds.
    pub mean_test_pnl: f64,
    pub worst_test_drawdown: f64,
    /// Σ test hits / Σ test samples; 0.0 with no samples.
    pub pooled_test_accuracy: f64,
    pub total_test_trades: usize,
}

impl ValidationReport {
    fn aggregate(plan: ValidationPlan, folds: Vec<FoldReport>) -> Self {
        let mean_test_pnl = if folds.is_empty() {
            0.0
        } else {
            folds.iter().map(|f| f.test_backtest.total_pnl).sum::<f64>() / folds.len() as f64
        };
        let worst_test_drawdown = folds
            .iter()
            .map(|f| f.test_backtest.max_drawdown)
            .fold(0.0_f64, f64::max);
        let samples: usize = folds.iter().map(|f| f.test_accuracy.samples).sum();
        let hits: usize = folds.iter().map(|f| f.test_accuracy.hits).sum();
        let pooled_test_accuracy = if samples > 0 {
            hits as f64 / samples as f64
        } else {
            0.0
        };
        let total_test_trades = folds.iter().map(|f| f.test_backtest.n_trades).sum();

        Self {
            plan,
            folds,
            mean_test_pnl,
            worst_test_drawdown,
            pooled_test_accuracy,
            total_test_trades,
        }
    }
}

// ─── Orchestration ───────────────────────────────────────────────────

/// Evaluate every fold of `plan` over `prices`/`signals`.
pub fn run_validation(
    prices: &PriceSeries,
    signals: &SignalSeries,
    plan: ValidationPlan,
    fee_bps: f64,
    slippage_bps: f64,
    horizon_bars: usize,
) -> Result<ValidationReport, EngineError> {
    let folds = plan.folds(prices.len())?;
    let aligned = signals.align_to(prices);

    let reports = folds
        .into_par_iter()
        .enumerate()
        .map(|(fold_index, ranges)| {
            let test_prices = prices.slice(ranges.test.clone());
            let backtest = run_backtest(
                &test_prices,
                &aligned[ranges.test.clone()],
                fee_bps,
                slippage_bps,
            )?;
            let test_accuracy = compute_accuracy(&test_prices, signals, horizon_bars)?;
            let train_accuracy = if ranges.train.is_empty() {
                None
            } else {
                let train_prices = prices.slice(ranges.train.clone());
                Some(compute_accuracy(&train_prices, signals, horizon_bars)?)
            };
            debug!(
                fold = fold_index,
                test_start = ranges.test.start,
                test_end = ranges.test.end,
                pnl = backtest.total_pnl,
                accuracy = test_accuracy.accuracy,
                "fold evaluated"
            );
            Ok(FoldReport {
                fold_index,
                train: ranges.train,
                test: ranges.test,
                test_backtest: FoldBacktest {
                    total_pnl: backtest.total_pnl,
                    max_drawdown: backtest.max_drawdown,
                    n_trades: backtest.n_trades,
                },
                test_accuracy,
                train_accuracy,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    Ok(ValidationReport::aggregate(plan, reports))
}
