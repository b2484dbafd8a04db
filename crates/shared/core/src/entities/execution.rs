use serde::{Deserialize, Serialize};

use super::{OrderId, Side};
use crate::values::{Price, Quantity, Symbol, Timestamp};

/// Fill reported by an execution provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub execution_id: String,
    pub order_id: OrderId,
    pub provider: String,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
    pub cumulative_quantity: Quantity,
    pub leaves_quantity: Quantity,
    pub timestamp: Timestamp,
}

impl Execution {
    /// True when nothing is left to fill
    pub fn is_complete(&self) -> bool {
        self.leaves_quantity.is_zero()
    }
}
