//! Domain types for siglab

pub mod bar;
pub mod price_series;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use price_series::PriceSeries;
pub use signal::{InvalidPosition, Position, SignalMetadata, SignalPoint, SignalSeries};
pub use trade::{Trade, TradeSide};
