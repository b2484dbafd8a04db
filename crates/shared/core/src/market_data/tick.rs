use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Price, Quantity, Symbol, Timestamp};

/// Top-of-book quote and last trade for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub provider: String,
    pub symbol: Symbol,
    pub bid_price: Price,
    pub bid_size: Quantity,
    pub ask_price: Price,
    pub ask_size: Quantity,
    pub last_price: Price,
    pub last_size: Quantity,
    pub timestamp: Timestamp,
}

impl Tick {
    /// Create a quote-only tick (no last trade)
    pub fn quote(
        provider: impl Into<String>,
        symbol: impl Into<Symbol>,
        bid_price: Price,
        bid_size: Quantity,
        ask_price: Price,
        ask_size: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            provider: provider.into(),
            symbol: symbol.into(),
            bid_price,
            bid_size,
            ask_price,
            ask_size,
            last_price: Decimal::ZERO,
            last_size: Decimal::ZERO,
            timestamp,
        }
    }

    /// Midpoint between bid and ask
    pub fn mid(&self) -> Price {
        (self.bid_price + self.ask_price) / Decimal::TWO
    }

    /// True if the tick carries a bid/ask pair
    pub fn has_quote(&self) -> bool {
        !self.bid_price.is_zero() && !self.ask_price.is_zero()
    }

    /// True if the tick carries a trade
    pub fn has_trade(&self) -> bool {
        !self.last_size.is_zero()
    }
}
