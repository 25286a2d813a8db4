//! Signals — discrete position intents keyed by timestamp.
//!
//! A [`SignalSeries`] may be sparse (only timestamps where the intent was
//! recorded) or dense (one point per bar). Extra per-point context travels in
//! an explicit metadata side channel, never inline on the point itself.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::price_series::PriceSeries;
use crate::error::DataError;

/// Held or desired exposure: short, flat or long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Position {
    Short,
    #[default]
    Flat,
    Long,
}

/// An integer outside {-1, 0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("position must be -1, 0 or 1, got {0}")]
pub struct InvalidPosition(pub i64);

impl Position {
    /// Signed exposure as a float multiplier.
    pub fn as_f64(self) -> f64 {
        i64::from(self) as f64
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl TryFrom<i64> for Position {
    type Error = InvalidPosition;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Position::Short),
            0 => Ok(Position::Flat),
            1 => Ok(Position::Long),
            other => Err(InvalidPosition(other)),
        }
    }
}

impl From<Position> for i64 {
    fn from(p: Position) -> i64 {
        match p {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

/// Desired position at or after `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalPoint {
    #[serde(rename = "ts")]
    pub timestamp: i64,
    #[serde(rename = "signal")]
    pub value: Position,
}

impl SignalPoint {
    pub fn new(timestamp: i64, value: Position) -> Self {
        Self { timestamp, value }
    }

    /// Build from a raw integer, rejecting values outside {-1, 0, 1}.
    pub fn from_raw(timestamp: i64, value: i64) -> Result<Self, DataError> {
        let value = Position::try_from(value)
            .map_err(|e| DataError::InvalidSignal { timestamp, value: e.0 })?;
        Ok(Self { timestamp, value })
    }
}

/// Per-point metadata: numeric key/value pairs keyed by the point's timestamp.
pub type SignalMetadata = BTreeMap<i64, BTreeMap<String, f64>>;

/// Timestamp-sorted, timestamp-unique signal points.
///
/// Deserialization runs through [`SignalSeries::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SignalSeriesRepr")]
pub struct SignalSeries {
    points: Vec<SignalPoint>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: SignalMetadata,
}

#[derive(Deserialize)]
struct SignalSeriesRepr {
    points: Vec<SignalPoint>,
    #[serde(default)]
    metadata: SignalMetadata,
}

impl TryFrom<SignalSeriesRepr> for SignalSeries {
    type Error = DataError;

    fn try_from(repr: SignalSeriesRepr) -> Result<Self, Self::Error> {
        Ok(SignalSeries::new(repr.points)?.with_metadata(repr.metadata))
    }
}

impl SignalSeries {
    /// Sort points by timestamp; duplicate timestamps are rejected.
    pub fn new(mut points: Vec<SignalPoint>) -> Result<Self, DataError> {
        points.sort_by_key(|p| p.timestamp);
        if let Some(dup) = points.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(DataError::DuplicateTimestamp(dup[0].timestamp));
        }
        Ok(Self {
            points,
            metadata: BTreeMap::new(),
        })
    }

    /// One point per bar of `prices`.
    pub fn from_dense(prices: &PriceSeries, values: Vec<Position>) -> Result<Self, DataError> {
        if values.len() != prices.len() {
            return Err(DataError::LengthMismatch {
                prices: prices.len(),
                signals: values.len(),
            });
        }
        let points = prices
            .bars()
            .iter()
            .zip(values)
            .map(|(bar, value)| SignalPoint::new(bar.timestamp, value))
            .collect();
        Ok(Self {
            points,
            metadata: BTreeMap::new(),
        })
    }

    pub fn with_metadata(mut self, metadata: SignalMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn points(&self) -> &[SignalPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn metadata(&self) -> &SignalMetadata {
        &self.metadata
    }

    pub fn metadata_at(&self, timestamp: i64) -> Option<&BTreeMap<String, f64>> {
        self.metadata.get(&timestamp)
    }

    /// Reindex onto the price timestamps.
    ///
    /// Bars without a signal point are flat; points whose timestamp is not in
    /// the price index are dropped.
    pub fn align_to(&self, prices: &PriceSeries) -> Vec<Position> {
        let mut aligned = vec![Position::Flat; prices.len()];
        for point in &self.points {
            if let Some(i) = prices.index_of(point.timestamp) {
                aligned[i] = point.value;
            }
        }
        aligned
    }
}
