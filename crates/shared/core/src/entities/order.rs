use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderStatus, OrderType, Side};
use crate::values::{ApplicationId, Price, Quantity, Symbol, Timestamp};

/// Unique identifier for an order
pub type OrderId = Uuid;

/// Order as submitted by a client application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Application that owns the order; order events are routed back to it
    pub app_id: ApplicationId,
    /// Execution provider the order is routed to
    pub provider: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
    /// Required for limit orders
    pub limit_price: Option<Price>,
    pub status: OrderStatus,
    pub created_at: Timestamp,
}

impl Order {
    /// Create a market order
    pub fn market(
        app_id: impl Into<ApplicationId>,
        provider: impl Into<String>,
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: Quantity,
    ) -> Self {
        Self::build(app_id, provider, symbol, side, OrderType::Market, quantity, None)
    }

    /// Create a limit order
    pub fn limit(
        app_id: impl Into<ApplicationId>,
        provider: impl Into<String>,
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: Quantity,
        limit_price: Price,
    ) -> Self {
        Self::build(
            app_id,
            provider,
            symbol,
            side,
            OrderType::Limit,
            quantity,
            Some(limit_price),
        )
    }

    fn build(
        app_id: impl Into<ApplicationId>,
        provider: impl Into<String>,
        symbol: impl Into<Symbol>,
        side: Side,
        order_type: OrderType,
        quantity: Quantity,
        limit_price: Option<Price>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            app_id: app_id.into(),
            provider: provider.into(),
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            limit_price,
            status: OrderStatus::Submitted,
            created_at: Utc::now(),
        }
    }

    /// Validate the order based on order type requirements
    pub fn validate(&self) -> bool {
        if self.quantity.is_sign_negative() || self.quantity.is_zero() {
            return false;
        }
        match self.order_type {
            OrderType::Market => self.limit_price.is_none(),
            OrderType::Limit => self.limit_price.is_some(),
        }
    }

    /// Copy of the order carrying a new status
    pub fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Request to cancel a working order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub app_id: ApplicationId,
    pub provider: String,
}
