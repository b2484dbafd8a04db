use serde::{Deserialize, Serialize};

use crate::values::{ApplicationId, Price, Quantity, Symbol};

/// Locate offer from a provider: shares available to borrow for shorting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocateOrder {
    pub locate_id: String,
    /// Application the offer is addressed to
    pub app_id: ApplicationId,
    pub provider: String,
    pub symbol: Symbol,
    pub quantity: Quantity,
    pub price: Price,
}

/// Application's answer to a `LocateOrder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateResponse {
    pub locate_id: String,
    pub app_id: ApplicationId,
    pub provider: String,
    pub accepted: bool,
}
