//! Train/test index ranges over a bar count.
//!
//! Two schemes, both lazy and restartable (the plans are `Copy`; call
//! `.iter()` again to restart):
//! - [`purged_kfold`]: `k` contiguous test folds; train is the prefix before
//!   the fold minus a purge gap
//! - [`walk_forward_anchored`]: fixed-size test windows sliding by `step`;
//!   train is everything before the window
//!
//! Neither touches data; they only produce `Range<usize>` pairs.

use std::iter::FusedIterator;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One train/test split as half-open bar index ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldRanges {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

// ─── Purged k-fold ───────────────────────────────────────────────────

/// Plan for `k` purged folds over `n` bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgedKFold {
    n: usize,
    k: usize,
    purge: usize,
}

/// Build a purged k-fold plan. `k` must be > 0.
///
/// Test folds have `n / k` bars; the last one runs to `n`. Train for fold `i`
/// is `[0, max(test_start - purge, 0))`.
pub fn purged_kfold(n: usize, k: usize, purge: usize) -> Result<PurgedKFold, ConfigError> {
    if k == 0 {
        return Err(ConfigError::NonPositiveFolds);
    }
    Ok(PurgedKFold { n, k, purge })
}

impl PurgedKFold {
    pub fn iter(&self) -> PurgedKFoldIter {
        PurgedKFoldIter {
            plan: *self,
            next: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.k
    }

    pub fn is_empty(&self) -> bool {
        self.k == 0
    }

    fn fold(&self, i: usize) -> FoldRanges {
        let size = self.n / self.k;
        let test_start = i * size;
        let test_end = if i + 1 < self.k { (i + 1) * size } else { self.n };
        FoldRanges {
            train: 0..test_start.saturating_sub(self.purge),
            test: test_start..test_end,
        }
    }
}

impl IntoIterator for PurgedKFold {
    type Item = FoldRanges;
    type IntoIter = PurgedKFoldIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct PurgedKFoldIter {
    plan: PurgedKFold,
    next: usize,
}

impl Iterator for PurgedKFoldIter {
    type Item = FoldRanges;

    fn next(&mut self) -> Option<FoldRanges> {
        if self.next >= self.plan.k {
            return None;
        }
        let fold = self.plan.fold(self.next);
        self.next += 1;
        Some(fold)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.k - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PurgedKFoldIter {}
impl FusedIterator for PurgedKFoldIter {}

// ─── Anchored walk-forward ───────────────────────────────────────────

/// Plan for anchored walk-forward windows over `n` bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkForwardAnchored {
    n: usize,
    window: usize,
    step: usize,
}

/// Build an anchored walk-forward plan. `window` and `step` must be > 0.
///
/// Test windows start at `0, step, 2*step, ...` while `start + window <= n`;
/// train is `[0, start)`.
pub fn walk_forward_anchored(
    n: usize,
    window: usize,
    step: usize,
) -> Result<WalkForwardAnchored, ConfigError> {
    if window == 0 {
        return Err(ConfigError::NonPositiveWindow);
    }
    if step == 0 {
        return Err(ConfigError::NonPositiveStep);
    }
    Ok(WalkForwardAnchored { n, window, step })
}

impl WalkForwardAnchored {
    pub fn iter(&self) -> WalkForwardIter {
        WalkForwardIter {
            plan: *self,
            start: 0,
        }
    }

    /// `(n - window) / step + 1`, or 0 when `n < window`.
    pub fn len(&self) -> usize {
        if self.n < self.window {
            0
        } else {
            (self.n - self.window) / self.step + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for WalkForwardAnchored {
    type Item = FoldRanges;
    type IntoIter = WalkForwardIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct WalkForwardIter {
    plan: WalkForwardAnchored,
    start: usize,
}

impl Iterator for WalkForwardIter {
    type Item = FoldRanges;

    fn next(&mut self) -> Option<FoldRanges> {
        let end = self.start.checked_add(self.plan.window)?;
        if end > self.plan.n {
            return None;
        }
        let fold = FoldRanges {
            train: 0..self.start,
            test: self.start..end,
        };
        // saturate so an overflowing step terminates instead of wrapping
        self.start = self.start.saturating_add(self.plan.step);
        Some(fold)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.start.checked_add(self.plan.window) {
            Some(end) if end <= self.plan.n => (self.plan.n - end) / self.plan.step + 1,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WalkForwardIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kfold_last_fold_absorbs_remainder() {
        let folds: Vec<_> = purged_kfold(10, 3, 1).unwrap().iter().collect();
        assert_eq!(folds.len(), 3);
        assert_eq!(folds[0], FoldRanges { train: 0..0, test: 0..3 });
        assert_eq!(folds[1], FoldRanges { train: 0..2, test: 3..6 });
        assert_eq!(folds[2], FoldRanges { train: 0..5, test: 6..10 });
    }

    #[test]
    fn kfold_zero_k_rejected() {
        assert_eq!(purged_kfold(10, 0, 0), Err(ConfigError::NonPositiveFolds));
    }

    #[test]
    fn kfold_is_restartable() {
        let plan = purged_kfold(100, 5, 20).unwrap();
        let a: Vec<_> = plan.iter().collect();
        let b: Vec<_> = plan.into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(plan.iter().len(), 5);
    }

    #[test]
    fn kfold_more_folds_than_bars() {
        let folds: Vec<_> = purged_kfold(2, 4, 0).unwrap().iter().collect();
        assert_eq!(folds.len(), 4);
        assert_eq!(folds[3].test, 0..2);
        assert!(folds[..3].iter().all(|f| f.test.is_empty()));
    }

    #[test]
    fn walk_forward_short_series_is_empty() {
        let plan = walk_forward_anchored(10, 20, 5).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.iter().count(), 0);
    }

    #[test]
    fn walk_forward_rejects_zero_params() {
        assert_eq!(
            walk_forward_anchored(10, 0, 1),
            Err(ConfigError::NonPositiveWindow)
        );
        assert_eq!(
            walk_forward_anchored(10, 1, 0),
            Err(ConfigError::NonPositiveStep)
        );
    }

    #[test]
    fn walk_forward_len_matches_iteration() {
        for (n, window, step) in [(10, 3, 2), (7, 7, 1), (100, 10, 30), (5, 1, 1)] {
            let plan = walk_forward_anchored(n, window, step).unwrap();
            assert_eq!(plan.len(), plan.iter().count(), "n={n} w={window} s={step}");
        }
    }
}
