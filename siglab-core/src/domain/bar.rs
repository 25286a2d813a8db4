//! Bar — one OHLCV observation.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// OHLCV bar keyed by a millisecond epoch timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(rename = "ts")]
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Field-level validity: OHLC finite and > 0, volume finite and >= 0.
    pub fn validate(&self) -> Result<(), DataError> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Err(DataError::InvalidBar {
                    timestamp: self.timestamp,
                    reason: format!("{name} must be finite and > 0, got {value}"),
                });
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(DataError::InvalidBar {
                timestamp: self.timestamp,
                reason: format!("volume must be finite and >= 0, got {}", self.volume),
            });
        }
        Ok(())
    }

    /// OHLC range check: high covers open/close, low sits under them.
    ///
    /// Assumed by the engine, never enforced.
    pub fn is_sane(&self) -> bool {
        self.validate().is_ok()
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }
}
