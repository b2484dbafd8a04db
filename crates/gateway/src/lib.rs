//! Hermes Gateway
//!
//! Everything between an engine server and the message broker:
//! - Transport abstraction (`MessageBroker`), with an in-process broker
//! - Wire codec for inbound requests and outbound domain events
//! - Queue/topology manager that declares the engine's queues and turns
//!   inbound deliveries into typed requests for the engine controller
//!
//! ## Architecture
//!
//! ```text
//!  client apps ──publish(exchange, rk)──▶ ┌──────────┐
//!                                         │  broker  │── md.login, md.subscribe, ...
//!  client apps ◀──── reply routing keys ──└────┬─────┘
//!                                              │ one consumer task per queue
//!                                      ┌───────▼────────┐
//!                                      │ QueueTopology  │── InboundRequest ──▶ handler
//!                                      │    Manager     │
//!                                      └────────────────┘
//! ```
//!
//! ## Transport
//!
//! `InMemoryBroker` implements direct and fanout exchanges inside one
//! process. The `MessageBroker` trait is what a networked broker client
//! implements to replace it.

pub mod error;
pub mod messages;
pub mod topology;
pub mod transport;

// Re-export commonly used types
pub use error::{GatewayError, TransportError};
pub use messages::{InboundKind, InboundRequest, JsonCodec, MessageCodec};
pub use topology::{
    QueueBinding, QueueTopologyManager, RequestHandler, RoutingKeys, TopologyConfig,
};
pub use transport::{
    ExchangeKind, MessageBroker, QueueSubscriber,
    memory::{ChannelQueueSubscriber, InMemoryBroker},
    recording::{PublishedMessage, RecordingBroker},
};
