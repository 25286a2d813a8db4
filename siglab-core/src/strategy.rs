//! Strategy registry — caller-owned mapping from name to signal function.
//!
//! There is no process-wide registry. Callers build a [`StrategyRegistry`]
//! (usually via [`StrategyRegistry::with_builtins`]), optionally register
//! their own strategies, and pass it where signals need generating.
//!
//! Strategies are pure: they see only the price series and its precomputed
//! feature columns, and return a signal series.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::{Position, PriceSeries, SignalSeries};
use crate::error::{ConfigError, DataError, EngineError};

/// A named, pure signal generator.
pub trait SignalStrategy: Send + Sync {
    /// Registry key (e.g., "mean_reversion").
    fn name(&self) -> &str;

    /// Produce signals for `prices`. Must only look at bar `i` and earlier
    /// when deciding the signal at bar `i`.
    fn generate(&self, prices: &PriceSeries) -> Result<SignalSeries, DataError>;
}

/// Adapter turning a closure into a [`SignalStrategy`].
pub struct FnStrategy<F> {
    name: String,
    f: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&PriceSeries) -> Result<SignalSeries, DataError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SignalStrategy for FnStrategy<F>
where
    F: Fn(&PriceSeries) -> Result<SignalSeries, DataError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prices: &PriceSeries) -> Result<SignalSeries, DataError> {
        (self.f)(prices)
    }
}

// ─── Built-in: mean reversion ────────────────────────────────────────

/// Long when RSI is oversold, short when overbought, flat otherwise.
///
/// Reads the precomputed `rsi` feature column. The raw signal is shifted one
/// bar forward, so the decision made on bar `i`'s RSI applies from bar `i+1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanReversion {
    pub rsi_buy: f64,
    pub rsi_sell: f64,
}

impl MeanReversion {
    pub const NAME: &'static str = "mean_reversion";
    pub const FEATURE: &'static str = "rsi";

    pub fn new(rsi_buy: f64, rsi_sell: f64) -> Self {
        Self { rsi_buy, rsi_sell }
    }
}

impl Default for MeanReversion {
    fn default() -> Self {
        Self::new(30.0, 70.0)
    }
}

impl SignalStrategy for MeanReversion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(&self, prices: &PriceSeries) -> Result<SignalSeries, DataError> {
        let rsi = prices
            .feature(Self::FEATURE)
            .ok_or_else(|| DataError::MissingFeature(Self::FEATURE.to_string()))?;

        // NaN compares false on both sides and stays flat
        let raw = rsi.iter().map(|&r| {
            if r <= self.rsi_buy {
                Position::Long
            } else if r >= self.rsi_sell {
                Position::Short
            } else {
                Position::Flat
            }
        });

        let shifted: Vec<Position> = std::iter::once(Position::Flat)
            .chain(raw)
            .take(prices.len())
            .collect();
        SignalSeries::from_dense(prices, shifted)
    }
}

// ─── Registry ────────────────────────────────────────────────────────

/// Name → strategy mapping, owned by the caller.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn SignalStrategy>>,
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in strategies at default parameters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(MeanReversion::default());
        registry
    }

    /// Register under the strategy's own name, replacing any previous entry.
    pub fn register<S: SignalStrategy + 'static>(&mut self, strategy: S) -> &mut Self {
        self.strategies
            .insert(strategy.name().to_string(), Arc::new(strategy));
        self
    }

    /// Register a closure under `name`.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&PriceSeries) -> Result<SignalSeries, DataError> + Send + Sync + 'static,
    {
        self.register(FnStrategy::new(name, f))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SignalStrategy>> {
        self.strategies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Run the named strategy over `prices`.
    pub fn generate(&self, name: &str, prices: &PriceSeries) -> Result<SignalSeries, EngineError> {
        let strategy = self
            .get(name)
            .ok_or_else(|| ConfigError::UnknownStrategy(name.to_string()))?;
        Ok(strategy.generate(prices)?)
    }
}
