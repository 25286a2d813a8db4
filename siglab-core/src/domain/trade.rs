//! Trade — an emitted position change.

use serde::{Deserialize, Serialize};

use super::signal::Position;

/// Direction of the position opened by a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Side that opens `position`; `None` for flat.
    pub fn opening(position: Position) -> Option<Self> {
        match position {
            Position::Long => Some(TradeSide::Buy),
            Position::Short => Some(TradeSide::Sell),
            Position::Flat => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// A non-flat position taken at a bar close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "ts")]
    pub timestamp: i64,
    pub side: TradeSide,
    pub price: f64,
    pub size: f64,
}
