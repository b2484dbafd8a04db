//! Error types for the gateway crate

use thiserror::Error;

use crate::messages::InboundKind;

/// Broker transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Declare failed: {0}")]
    Declare(String),

    #[error("Bind failed: {0}")]
    Bind(String),

    #[error("Subscription failed: {0}")]
    Subscribe(String),

    #[error("Publish to '{routing_key}' failed: {reason}")]
    Publish { routing_key: String, reason: String },

    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("Unknown queue: {0}")]
    UnknownQueue(String),

    #[error("Channel closed")]
    ChannelClosed,
}

/// Gateway-level errors (codec, topology, handler registration)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to encode {message}: {reason}")]
    Encode { message: String, reason: String },

    #[error("Failed to decode {kind} payload: {reason}")]
    Decode { kind: InboundKind, reason: String },

    #[error("Failed to decode event: {0}")]
    EventDecode(String),

    #[error("A handler is already registered for {0} requests")]
    HandlerAlreadyRegistered(InboundKind),

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
}
