//! PriceSeries — ascending, timestamp-unique bars plus optional feature columns.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::bar::Bar;
use crate::error::DataError;

/// Ordered bars for one instrument and timeframe.
///
/// Feature columns are precomputed upstream (indicators such as `rsi`) and are
/// always exactly as long as `bars`. Deserialization goes through
/// [`PriceSeries::new`] and [`PriceSeries::with_feature`], so a decoded series
/// holds the same invariants as a constructed one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriceSeriesRepr")]
pub struct PriceSeries {
    bars: Vec<Bar>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    features: BTreeMap<String, Vec<f64>>,
}

/// Unvalidated wire form.
#[derive(Deserialize)]
struct PriceSeriesRepr {
    bars: Vec<Bar>,
    #[serde(default)]
    features: BTreeMap<String, Vec<f64>>,
}

impl TryFrom<PriceSeriesRepr> for PriceSeries {
    type Error = DataError;

    fn try_from(repr: PriceSeriesRepr) -> Result<Self, Self::Error> {
        repr.features
            .into_iter()
            .try_fold(PriceSeries::new(repr.bars)?, |series, (name, values)| {
                series.with_feature(name, values)
            })
    }
}

impl PriceSeries {
    /// Build from bars that are already in ascending timestamp order.
    pub fn new(bars: Vec<Bar>) -> Result<Self, DataError> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate()?;
            if i > 0 {
                let previous = bars[i - 1].timestamp;
                if bar.timestamp == previous {
                    return Err(DataError::DuplicateTimestamp(bar.timestamp));
                }
                if bar.timestamp < previous {
                    return Err(DataError::UnsortedTimestamps {
                        index: i,
                        previous,
                        current: bar.timestamp,
                    });
                }
            }
        }
        Ok(Self {
            bars,
            features: BTreeMap::new(),
        })
    }

    /// Sort by timestamp, then validate.
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Result<Self, DataError> {
        bars.sort_by_key(|b| b.timestamp);
        Self::new(bars)
    }

    /// Attach a named feature column.
    pub fn with_feature(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        if values.len() != self.bars.len() {
            return Err(DataError::FeatureLength {
                name,
                len: values.len(),
                bars: self.bars.len(),
            });
        }
        self.features.insert(name, values);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// Position of `timestamp` in the series, if present.
    pub fn index_of(&self, timestamp: i64) -> Option<usize> {
        self.bars
            .binary_search_by_key(&timestamp, |b| b.timestamp)
            .ok()
    }

    pub fn feature(&self, name: &str) -> Option<&[f64]> {
        self.features.get(name).map(Vec::as_slice)
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Sub-series over a bar index range; features are sliced alongside.
    ///
    /// The range is clamped to the series bounds.
    pub fn slice(&self, range: Range<usize>) -> PriceSeries {
        let end = range.end.min(self.bars.len());
        let start = range.start.min(end);
        PriceSeries {
            bars: self.bars[start..end].to_vec(),
            features: self
                .features
                .iter()
                .map(|(name, values)| (name.clone(), values[start..end].to_vec()))
                .collect(),
        }
    }
}
