//! Outbound domain events
//!
//! Everything an engine server sends back to a client application is one of
//! these. Each variant knows its `MessageType` (which reply destination it
//! uses) and whether it travels on the high-frequency data plane.

use serde::{Deserialize, Serialize};

use crate::entities::{Execution, LocateOrder, Order, Position, Rejection};
use crate::market_data::{Bar, HistoricBarData, Tick};
use crate::messages::{HeartbeatResponse, InquiryResponse, Login, Logout, MessageType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainEvent {
    Logon(Login),
    Logout(Logout),
    Tick(Tick),
    Bar(Bar),
    HistoricBarData(HistoricBarData),
    OrderAccepted(Order),
    OrderCancelled(Order),
    Execution(Execution),
    Rejection(Rejection),
    Locate(LocateOrder),
    Position(Position),
    InquiryResponse(InquiryResponse),
    Heartbeat(HeartbeatResponse),
}

impl DomainEvent {
    /// Reply destination class for this event
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Logon(_) | Self::Logout(_) | Self::InquiryResponse(_) | Self::Heartbeat(_) => {
                MessageType::Admin
            }
            Self::Tick(_) => MessageType::Tick,
            Self::Bar(_) => MessageType::LiveBar,
            Self::HistoricBarData(_) => MessageType::HistoricBar,
            Self::OrderAccepted(_) | Self::OrderCancelled(_) | Self::Position(_) => {
                MessageType::Order
            }
            Self::Execution(_) => MessageType::Execution,
            Self::Rejection(_) => MessageType::Rejection,
            Self::Locate(_) => MessageType::Locate,
        }
    }

    /// True for high-frequency market data and order flow
    ///
    /// Data-plane events go through the ring-buffer dispatcher; the rest are
    /// published directly.
    pub fn is_data_plane(&self) -> bool {
        matches!(
            self,
            Self::Tick(_)
                | Self::Bar(_)
                | Self::HistoricBarData(_)
                | Self::OrderAccepted(_)
                | Self::OrderCancelled(_)
                | Self::Execution(_)
                | Self::Rejection(_)
        )
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Logon(_) => "Logon",
            Self::Logout(_) => "Logout",
            Self::Tick(_) => "Tick",
            Self::Bar(_) => "Bar",
            Self::HistoricBarData(_) => "HistoricBarData",
            Self::OrderAccepted(_) => "OrderAccepted",
            Self::OrderCancelled(_) => "OrderCancelled",
            Self::Execution(_) => "Execution",
            Self::Rejection(_) => "Rejection",
            Self::Locate(_) => "Locate",
            Self::Position(_) => "Position",
            Self::InquiryResponse(_) => "InquiryResponse",
            Self::Heartbeat(_) => "Heartbeat",
        }
    }
}
