//! Broker transport abstraction
//!
//! Publishing is synchronous so it can be called from the dispatcher's
//! consumer thread and from provider callback threads alike. Consuming is
//! async: each queue is drained by its own tokio task.

pub mod memory;
pub mod recording;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// How an exchange matches routing keys to bound queues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    /// Deliver to queues bound with exactly the published routing key
    #[default]
    Direct,
    /// Deliver to every bound queue regardless of routing key
    Fanout,
}

/// Port for a message broker client
pub trait MessageBroker: Send + Sync {
    /// Declare an exchange; redeclaring with the same kind is a no-op
    fn declare_exchange(&self, exchange: &str, kind: ExchangeKind) -> Result<(), TransportError>;

    /// Declare a queue; redeclaring is a no-op
    fn declare_queue(&self, queue: &str) -> Result<(), TransportError>;

    fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), TransportError>;

    /// Publish a payload; messages matching no binding are dropped
    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Start consuming a queue
    fn consume(&self, queue: &str) -> Result<Box<dyn QueueSubscriber>, TransportError>;

    fn delete_queue(&self, queue: &str) -> Result<(), TransportError>;

    /// Release broker resources; active subscribers see `ChannelClosed`
    fn close(&self) -> Result<(), TransportError>;
}

/// Receives raw deliveries from one queue
#[async_trait]
pub trait QueueSubscriber: Send {
    /// Name of the queue this subscriber drains
    fn queue(&self) -> &str;

    /// Wait for the next delivery
    async fn next(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Try to receive without waiting (returns None if nothing is queued)
    fn try_next(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}
