//! TOML evaluation config.
//!
//! ```toml
//! [dataset]
//! market = "crypto"
//! symbol = "BTCUSDT"
//! timeframe = "1h"
//! prices = "btcusdt_1h.csv"
//! signals = "btcusdt_1h_signals.csv"
//!
//! [costs]
//! fee_bps = 10.0
//! slippage_bps = 5.0
//!
//! [accuracy]
//! horizon_bars = 24
//!
//! [validation]
//! mode = "purged_kfold"
//! k = 5
//! purge = 20
//! ```
//!
//! Relative paths are resolved against the config file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::SeriesKey;
use crate::validation::ValidationPlan;

/// Errors from reading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Engine(#[from] siglab_core::ConfigError),
}

/// Full evaluation config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub costs: CostConfig,
    #[serde(default)]
    pub accuracy: AccuracyConfig,
    #[serde(default)]
    pub validation: Option<ValidationPlan>,
}

/// Which series to evaluate and where its data comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_tenant")]
    pub tenant: String,
    pub market: String,
    pub symbol: String,
    pub timeframe: String,
    /// Price CSV path.
    pub prices: PathBuf,
    /// Signal CSV path. Exclusive with `strategy`.
    #[serde(default)]
    pub signals: Option<PathBuf>,
    /// Registry strategy name. Exclusive with `signals`.
    #[serde(default)]
    pub strategy: Option<String>,
}

fn default_tenant() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_fee_bps")]
    pub fee_bps: f64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: f64,
}

fn default_fee_bps() -> f64 {
    10.0
}

fn default_slippage_bps() -> f64 {
    5.0
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            fee_bps: default_fee_bps(),
            slippage_bps: default_slippage_bps(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyConfig {
    #[serde(default = "default_horizon_bars")]
    pub horizon_bars: usize,
}

fn default_horizon_bars() -> usize {
    24
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            horizon_bars: default_horizon_bars(),
        }
    }
}

/// Where the signals for a run come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalSource {
    File(PathBuf),
    Strategy(String),
}

impl EvalConfig {
    /// Parse and validate a TOML string. Paths are kept as written.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EvalConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file, resolving relative data paths
    /// against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.dataset.prices.is_relative() {
            self.dataset.prices = base.join(&self.dataset.prices);
        }
        if let Some(signals) = self.dataset.signals.as_mut() {
            if signals.is_relative() {
                *signals = base.join(&*signals);
            }
        }
    }

    /// Check parameter ranges and the signals/strategy exclusivity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.signal_source()?;
        for (name, value) in [
            ("dataset.market", &self.dataset.market),
            ("dataset.symbol", &self.dataset.symbol),
            ("dataset.timeframe", &self.dataset.timeframe),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        siglab_core::cost_rate(self.costs.fee_bps, self.costs.slippage_bps)?;
        if self.accuracy.horizon_bars == 0 {
            return Err(siglab_core::ConfigError::NonPositiveHorizon.into());
        }
        if let Some(plan) = &self.validation {
            plan.check()?;
        }
        Ok(())
    }

    /// The configured signal source; exactly one of `signals`/`strategy` must be set.
    pub fn signal_source(&self) -> Result<SignalSource, ConfigError> {
        match (&self.dataset.signals, &self.dataset.strategy) {
            (Some(path), None) => Ok(SignalSource::File(path.clone())),
            (None, Some(name)) => Ok(SignalSource::Strategy(name.clone())),
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "dataset.signals and dataset.strategy are mutually exclusive".into(),
            )),
            (None, None) => Err(ConfigError::Invalid(
                "one of dataset.signals or dataset.strategy is required".into(),
            )),
        }
    }

    pub fn series_key(&self) -> SeriesKey {
        SeriesKey {
            tenant: self.dataset.tenant.clone(),
            market: self.dataset.market.clone(),
            symbol: self.dataset.symbol.clone(),
            timeframe: self.dataset.timeframe.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[dataset]
market = "crypto"
symbol = "BTCUSDT"
timeframe = "1h"
prices = "prices.csv"
signals = "signals.csv"
"#;

    #[test]
    fn defaults_apply() {
        let config = EvalConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.dataset.tenant, "default");
        assert_eq!(config.costs, CostConfig { fee_bps: 10.0, slippage_bps: 5.0 });
        assert_eq!(config.accuracy.horizon_bars, 24);
        assert!(config.validation.is_none());
        assert_eq!(
            config.signal_source().unwrap(),
            SignalSource::File(PathBuf::from("signals.csv"))
        );
    }

    #[test]
    fn strategy_and_signals_are_exclusive() {
        let toml = format!("{MINIMAL}strategy = \"mean_reversion\"\n");
        let err = EvalConfig::from_toml_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_horizon_rejected() {
        let toml = format!("{MINIMAL}\n[accuracy]\nhorizon_bars = 0\n");
        let err = EvalConfig::from_toml_str(&toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Engine(siglab_core::ConfigError::NonPositiveHorizon)
        ));
    }

    #[test]
    fn negative_fee_rejected() {
        let toml = format!("{MINIMAL}\n[costs]\nfee_bps = -1.0\n");
        assert!(matches!(
            EvalConfig::from_toml_str(&toml),
            Err(ConfigError::Engine(siglab_core::ConfigError::InvalidCost { .. }))
        ));
    }

    #[test]
    fn series_key_from_dataset() {
        let key = EvalConfig::from_toml_str(MINIMAL).unwrap().series_key();
        assert_eq!(key.symbol, "BTCUSDT");
        assert_eq!(key.tenant, "default");
    }
}
