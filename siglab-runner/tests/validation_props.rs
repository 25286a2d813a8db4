//! Property tests for fold validation and CSV loading.
//!
//! 1. Purged k-fold validation tests every bar exactly once
//! 2. Fold-level aggregates stay within their bounds
//! 3. Price rows load identically regardless of row order

use proptest::prelude::*;
use siglab_core::{Position, SignalSeries};
use siglab_runner::data_loader::read_prices;
use siglab_runner::synthetic_prices;
use siglab_runner::validation::{run_validation, ValidationPlan};

fn arb_position() -> impl Strategy<Value = Position> {
    prop_oneof![Just(Position::Short), Just(Position::Flat), Just(Position::Long)]
}

// ── 1-2. Validation ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn kfold_validation_tiles_and_bounds(
        n in 0usize..200,
        k in 1usize..8,
        purge in 0usize..30,
        seed in any::<u64>(),
        raw in prop::collection::vec(arb_position(), 200),
    ) {
        let prices = synthetic_prices(n, seed, 0, 60_000).unwrap();
        let signals = SignalSeries::from_dense(&prices, raw[..n].to_vec()).unwrap();
        let plan = ValidationPlan::PurgedKFold { k, purge };
        let report = run_validation(&prices, &signals, plan, 10.0, 5.0, 3).unwrap();

        prop_assert_eq!(report.folds.len(), k);
        let covered: usize = report.folds.iter().map(|f| f.test.len()).sum();
        prop_assert_eq!(covered, n);
        for (i, fold) in report.folds.iter().enumerate() {
            prop_assert_eq!(fold.fold_index, i);
            prop_assert!(fold.train.end <= fold.test.start);
            prop_assert!(fold.test_backtest.max_drawdown >= 0.0);
        }
        prop_assert!((0.0..=1.0).contains(&report.pooled_test_accuracy));
        prop_assert!(report.worst_test_drawdown >= 0.0);
        prop_assert!(report.mean_test_pnl.is_finite());
    }
}

// ── 3. Loader ordering ───────────────────────────────────────────────

proptest! {
    #[test]
    fn row_order_does_not_matter(
        closes in prop::collection::vec(1.0..500.0_f64, 1..40),
        rotate in 0usize..40,
    ) {
        let rows: Vec<String> = closes
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{},{c},{c},{c},{c},1,{}", i * 1000, i))
            .collect();
        let header = "ts,open,high,low,close,volume,idx\n";
        let sorted = format!("{header}{}\n", rows.join("\n"));
        let mut shuffled_rows = rows.clone();
        let len = shuffled_rows.len();
        shuffled_rows.rotate_left(rotate % len);
        let shuffled = format!("{header}{}\n", shuffled_rows.join("\n"));

        let a = read_prices(sorted.as_bytes()).unwrap();
        let b = read_prices(shuffled.as_bytes()).unwrap();
        prop_assert_eq!(a.closes(), b.closes());
        prop_assert_eq!(a.feature("idx"), b.feature("idx"));
    }
}
