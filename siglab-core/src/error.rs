//! Error taxonomy for the engine.
//!
//! Two families, both terminal for the call that raised them:
//! - [`DataError`]: malformed or insufficient input data
//! - [`ConfigError`]: invalid call parameters
//!
//! [`EngineError`] is what the public entry points return.

use thiserror::Error;

/// Malformed or insufficient input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("length mismatch: {prices} price bars vs {signals} signals")]
    LengthMismatch { prices: usize, signals: usize },

    #[error("non-positive price {close} at bar {index} (ts {timestamp})")]
    NonPositivePrice {
        index: usize,
        timestamp: i64,
        close: f64,
    },

    #[error("timestamps not ascending at index {index}: {previous} then {current}")]
    UnsortedTimestamps {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("duplicate timestamp {0}")]
    DuplicateTimestamp(i64),

    #[error("invalid bar at ts {timestamp}: {reason}")]
    InvalidBar { timestamp: i64, reason: String },

    #[error("invalid signal value {value} at ts {timestamp} (expected -1, 0 or 1)")]
    InvalidSignal { timestamp: i64, value: i64 },

    #[error("feature '{name}' has {len} values for {bars} bars")]
    FeatureLength {
        name: String,
        len: usize,
        bars: usize,
    },

    #[error("missing feature column '{0}'")]
    MissingFeature(String),
}

/// Invalid parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("horizon_bars must be > 0")]
    NonPositiveHorizon,

    #[error("fold count k must be > 0")]
    NonPositiveFolds,

    #[error("window must be > 0")]
    NonPositiveWindow,

    #[error("step must be > 0")]
    NonPositiveStep,

    #[error("{name} must be a finite value >= 0, got {value}")]
    InvalidCost { name: &'static str, value: f64 },

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
}

/// Error returned by engine entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_wraps_both_families() {
        let e: EngineError = DataError::DuplicateTimestamp(5).into();
        assert!(matches!(e, EngineError::Data(_)));
        assert_eq!(e.to_string(), "data error: duplicate timestamp 5");

        let e: EngineError = ConfigError::NonPositiveHorizon.into();
        assert!(matches!(e, EngineError::Config(_)));
    }
}
