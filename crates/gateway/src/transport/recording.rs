//! Broker tap that records every publish
//!
//! Wraps another broker and keeps a copy of each publish call, in order.
//! Routing keys can be marked as failing to exercise error paths.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::transport::memory::InMemoryBroker;
use crate::transport::{ExchangeKind, MessageBroker, QueueSubscriber};

/// One recorded publish call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

pub struct RecordingBroker {
    inner: Arc<dyn MessageBroker>,
    published: Mutex<Vec<PublishedMessage>>,
    failing_keys: Mutex<HashSet<String>>,
}

impl Default for RecordingBroker {
    fn default() -> Self {
        Self::wrap(Arc::new(InMemoryBroker::new()))
    }
}

impl RecordingBroker {
    /// Record in front of a fresh `InMemoryBroker`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap(inner: Arc<dyn MessageBroker>) -> Self {
        Self {
            inner,
            published: Mutex::new(Vec::new()),
            failing_keys: Mutex::new(HashSet::new()),
        }
    }

    /// Make every publish to `routing_key` fail
    pub fn fail_publishes_to(&self, routing_key: &str) {
        self.failing_keys.lock().insert(routing_key.to_string());
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().clone()
    }

    /// Recorded publishes whose routing key equals `routing_key`
    pub fn published_to(&self, routing_key: &str) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .iter()
            .filter(|m| m.routing_key == routing_key)
            .cloned()
            .collect()
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().len()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

impl MessageBroker for RecordingBroker {
    fn declare_exchange(&self, exchange: &str, kind: ExchangeKind) -> Result<(), TransportError> {
        self.inner.declare_exchange(exchange, kind)
    }

    fn declare_queue(&self, queue: &str) -> Result<(), TransportError> {
        self.inner.declare_queue(queue)
    }

    fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), TransportError> {
        self.inner.bind_queue(queue, exchange, routing_key)
    }

    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.published.lock().push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.to_vec(),
        });

        if self.failing_keys.lock().contains(routing_key) {
            return Err(TransportError::Publish {
                routing_key: routing_key.to_string(),
                reason: "configured to fail".to_string(),
            });
        }
        self.inner.publish(exchange, routing_key, payload)
    }

    fn consume(&self, queue: &str) -> Result<Box<dyn QueueSubscriber>, TransportError> {
        self.inner.consume(queue)
    }

    fn delete_queue(&self, queue: &str) -> Result<(), TransportError> {
        self.inner.delete_queue(queue)
    }

    fn close(&self) -> Result<(), TransportError> {
        self.inner.close()
    }
}
