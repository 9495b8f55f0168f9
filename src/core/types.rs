//! Core types - Strong typing for safety

use ethers::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Directional arrow used in trade confirmations
    pub fn glyph(&self) -> &'static str {
        match self {
            Side::Buy => "⬆️",
            Side::Sell => "⬇️",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = crate::core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(crate::core::Error::Config(format!(
                "unknown side: {other}"
            ))),
        }
    }
}

/// A logical trade intent: buy or sell an instrument against each
/// exchange's configured trading asset. One per incoming request.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    pub side: Side,
    /// Instrument token - address or a symbol resolvable via the token map
    pub instrument: String,
    /// Multiplier applied to the exchange's configured risk amount
    pub quantity: Decimal,
}

impl OrderIntent {
    pub fn new(side: Side, instrument: impl Into<String>) -> Self {
        Self {
            side,
            instrument: instrument.into(),
            quantity: Decimal::ONE,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Per-exchange price quote, never persisted
#[derive(Debug, Clone)]
pub struct Quote {
    pub price: Decimal,
    pub symbol: String,
}

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.price.normalize(), self.symbol)
    }
}

/// Resolve the (sell, buy) token pair for an intent on one exchange.
///
/// BUY spends the exchange's trading asset to acquire the instrument;
/// SELL is the reverse. Identical resolution across all configured venues.
pub fn resolve_direction(side: Side, trading_asset: Address, instrument: Address) -> (Address, Address) {
    match side {
        Side::Buy => (trading_asset, instrument),
        Side::Sell => (instrument, trading_asset),
    }
}
