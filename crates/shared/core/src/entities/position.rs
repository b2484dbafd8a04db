use serde::{Deserialize, Serialize};

use crate::values::{ApplicationId, Price, Quantity, Symbol};

/// Position held at a provider on behalf of an application
///
/// Quantity is signed: positive for long, negative for short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub app_id: ApplicationId,
    pub provider: String,
    pub symbol: Symbol,
    pub quantity: Quantity,
    pub average_price: Price,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    pub fn is_short(&self) -> bool {
        self.quantity.is_sign_negative() && !self.quantity.is_zero()
    }
}
