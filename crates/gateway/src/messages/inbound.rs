//! Inbound request vocabulary
//!
//! Each broker queue carries exactly one kind of request, so the queue a
//! delivery arrives on determines how its payload is decoded.

use std::fmt;

use hermes_core::{
    AppInfo, ApplicationId, CancelOrder, Heartbeat, HistoricBarRequest, Inquiry, LocateResponse,
    Login, Logout, Order, Subscribe, Unsubscribe,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundKind {
    Login,
    Logout,
    Subscribe,
    Unsubscribe,
    HistoricBars,
    MarketOrder,
    LimitOrder,
    CancelOrder,
    LocateResponse,
    Inquiry,
    AppInfo,
    Heartbeat,
}

impl InboundKind {
    pub const ALL: [InboundKind; 12] = [
        Self::Login,
        Self::Logout,
        Self::Subscribe,
        Self::Unsubscribe,
        Self::HistoricBars,
        Self::MarketOrder,
        Self::LimitOrder,
        Self::CancelOrder,
        Self::LocateResponse,
        Self::Inquiry,
        Self::AppInfo,
        Self::Heartbeat,
    ];

    /// Queues consumed by a market data engine
    pub const MARKET_DATA: [InboundKind; 8] = [
        Self::Login,
        Self::Logout,
        Self::Subscribe,
        Self::Unsubscribe,
        Self::HistoricBars,
        Self::Inquiry,
        Self::AppInfo,
        Self::Heartbeat,
    ];

    /// Queues consumed by an order execution engine
    pub const ORDER_EXECUTION: [InboundKind; 9] = [
        Self::Login,
        Self::Logout,
        Self::MarketOrder,
        Self::LimitOrder,
        Self::CancelOrder,
        Self::LocateResponse,
        Self::Inquiry,
        Self::AppInfo,
        Self::Heartbeat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::HistoricBars => "historic_bars",
            Self::MarketOrder => "market_order",
            Self::LimitOrder => "limit_order",
            Self::CancelOrder => "cancel_order",
            Self::LocateResponse => "locate_response",
            Self::Inquiry => "inquiry",
            Self::AppInfo => "app_info",
            Self::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for InboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded client request
#[derive(Debug, Clone, PartialEq)]
pub enum InboundRequest {
    Login(Login),
    Logout(Logout),
    Subscribe(Subscribe),
    Unsubscribe(Unsubscribe),
    HistoricBars(HistoricBarRequest),
    MarketOrder(Order),
    LimitOrder(Order),
    CancelOrder(CancelOrder),
    LocateResponse(LocateResponse),
    Inquiry(Inquiry),
    AppInfo(AppInfo),
    Heartbeat(Heartbeat),
}

impl InboundRequest {
    pub fn kind(&self) -> InboundKind {
        match self {
            Self::Login(_) => InboundKind::Login,
            Self::Logout(_) => InboundKind::Logout,
            Self::Subscribe(_) => InboundKind::Subscribe,
            Self::Unsubscribe(_) => InboundKind::Unsubscribe,
            Self::HistoricBars(_) => InboundKind::HistoricBars,
            Self::MarketOrder(_) => InboundKind::MarketOrder,
            Self::LimitOrder(_) => InboundKind::LimitOrder,
            Self::CancelOrder(_) => InboundKind::CancelOrder,
            Self::LocateResponse(_) => InboundKind::LocateResponse,
            Self::Inquiry(_) => InboundKind::Inquiry,
            Self::AppInfo(_) => InboundKind::AppInfo,
            Self::Heartbeat(_) => InboundKind::Heartbeat,
        }
    }

    /// Application that sent the request, when the request names one
    ///
    /// An `AppId` inquiry is sent before the client has an id.
    pub fn app_id(&self) -> Option<&ApplicationId> {
        match self {
            Self::Login(m) => Some(&m.app_id),
            Self::Logout(m) => Some(&m.app_id),
            Self::Subscribe(m) => Some(&m.app_id),
            Self::Unsubscribe(m) => Some(&m.app_id),
            Self::HistoricBars(m) => Some(&m.app_id),
            Self::MarketOrder(m) | Self::LimitOrder(m) => Some(&m.app_id),
            Self::CancelOrder(m) => Some(&m.app_id),
            Self::LocateResponse(m) => Some(&m.app_id),
            Self::Inquiry(m) => m.app_id.as_ref(),
            Self::AppInfo(m) => Some(&m.app_id),
            Self::Heartbeat(m) => Some(&m.app_id),
        }
    }
}
