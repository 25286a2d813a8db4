//! Directional accuracy of signals against forward returns.
//!
//! A non-flat signal at price index `i` is scored against
//! `(close[i + h] - close[i]) / close[i]`. It is a hit when the sign of that
//! return equals the signal; a zero return is never a hit. Signals without
//! `h` bars of forward data are dropped, not failed.

use serde::{Deserialize, Serialize};

use crate::domain::{Position, PriceSeries, SignalSeries};
use crate::error::{ConfigError, DataError, EngineError};

/// Sample and hit counts for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    pub n: usize,
    pub hits: usize,
}

impl SideStats {
    /// Hit rate for this side; 0.0 when there are no samples.
    pub fn accuracy(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.hits as f64 / self.n as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BySide {
    pub long: SideStats,
    pub short: SideStats,
}

/// Hit-rate statistics for a signal series at one horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyResult {
    pub samples: usize,
    pub hits: usize,
    /// `hits / samples`, or 0.0 when there are no samples.
    pub accuracy: f64,
    pub by_side: BySide,
}

impl AccuracyResult {
    fn from_sides(by_side: BySide) -> Self {
        let samples = by_side.long.n + by_side.short.n;
        let hits = by_side.long.hits + by_side.short.hits;
        let accuracy = if samples > 0 {
            hits as f64 / samples as f64
        } else {
            0.0
        };
        Self {
            samples,
            hits,
            accuracy,
            by_side,
        }
    }
}

fn sign(x: f64) -> i64 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Score `signals` against `horizon_bars`-ahead returns of `prices`.
pub fn compute_accuracy(
    prices: &PriceSeries,
    signals: &SignalSeries,
    horizon_bars: usize,
) -> Result<AccuracyResult, EngineError> {
    if horizon_bars == 0 {
        return Err(ConfigError::NonPositiveHorizon.into());
    }

    let bars = prices.bars();
    let mut by_side = BySide::default();

    for point in signals.points() {
        if point.value.is_flat() {
            continue;
        }
        let Some(i) = prices.index_of(point.timestamp) else {
            continue;
        };
        let Some(forward) = i.checked_add(horizon_bars).and_then(|j| bars.get(j)) else {
            continue;
        };
        let base = bars[i].close;
        if !base.is_finite() || base <= 0.0 {
            return Err(DataError::NonPositivePrice {
                index: i,
                timestamp: bars[i].timestamp,
                close: base,
            }
            .into());
        }
        let fwd_ret = (forward.close - base) / base;
        let hit = sign(fwd_ret) == i64::from(point.value);

        let side = match point.value {
            Position::Long => &mut by_side.long,
            Position::Short => &mut by_side.short,
            Position::Flat => continue,
        };
        side.n += 1;
        if hit {
            side.hits += 1;
        }
    }

    Ok(AccuracyResult::from_sides(by_side))
}
