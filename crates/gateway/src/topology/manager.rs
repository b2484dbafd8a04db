//! Queue/topology manager
//!
//! Declares the engine's exchange and request queues, then runs one
//! consumer task per queue. Each task decodes deliveries for its kind and
//! hands them to the handler registered for that kind. Handlers are
//! synchronous and may block (provider calls, a full dispatcher ring), so
//! each one runs on the blocking pool while its queue's task waits for it.
//! A slow handler only holds up its own queue; deliveries within a queue
//! stay in order.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hermes_core::DomainEvent;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::{GatewayError, TransportError};
use crate::messages::{InboundKind, InboundRequest, MessageCodec};
use crate::topology::config::TopologyConfig;
use crate::transport::{MessageBroker, QueueSubscriber};

/// Callback invoked for every decoded request of one kind
pub type RequestHandler = Arc<dyn Fn(InboundRequest) + Send + Sync>;

type HandlerTable = Arc<RwLock<HashMap<InboundKind, RequestHandler>>>;

pub struct QueueTopologyManager {
    broker: Arc<dyn MessageBroker>,
    codec: Arc<dyn MessageCodec>,
    config: TopologyConfig,
    handlers: HandlerTable,
    consumers: Mutex<Vec<JoinHandle<()>>>,
    connected: AtomicBool,
}

impl QueueTopologyManager {
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        codec: Arc<dyn MessageCodec>,
        config: TopologyConfig,
    ) -> Self {
        Self {
            broker,
            codec,
            config,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            consumers: Mutex::new(Vec::new()),
            connected: AtomicBool::new(false),
        }
    }

    /// Register the handler for one request kind
    ///
    /// Each kind has a single slot; registering again fails with
    /// `HandlerAlreadyRegistered` and keeps the first handler.
    pub fn on_request<F>(&self, kind: InboundKind, handler: F) -> Result<(), GatewayError>
    where
        F: Fn(InboundRequest) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&kind) {
            return Err(GatewayError::HandlerAlreadyRegistered(kind));
        }
        handlers.insert(kind, Arc::new(handler));
        Ok(())
    }

    pub fn has_handler(&self, kind: InboundKind) -> bool {
        self.handlers.read().contains_key(&kind)
    }

    /// Declare the exchange and queues and start consuming
    ///
    /// Must run inside a tokio runtime. Calling it again while connected is
    /// a no-op. Declaration and bind failures are returned to the caller.
    pub fn connect(&self) -> Result<(), GatewayError> {
        let mut consumers = self.consumers.lock();
        if self.connected.load(Ordering::Acquire) {
            debug!("Topology on '{}' already connected", self.config.exchange);
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Connection(format!("no tokio runtime: {}", e)))?;

        self.config.validate()?;
        self.broker
            .declare_exchange(&self.config.exchange, self.config.exchange_kind)?;

        for binding in self.config.queues.values() {
            self.broker.declare_queue(&binding.queue)?;
            self.broker
                .bind_queue(&binding.queue, &self.config.exchange, &binding.routing_key)?;
            debug!(
                "Bound queue '{}' to '{}' with '{}'",
                binding.queue, self.config.exchange, binding.routing_key
            );
        }

        let mut started = Vec::with_capacity(self.config.queues.len());
        for (&kind, binding) in &self.config.queues {
            let subscriber = match self.broker.consume(&binding.queue) {
                Ok(subscriber) => subscriber,
                Err(e) => {
                    started.iter().for_each(JoinHandle::abort);
                    return Err(e.into());
                }
            };
            started.push(runtime.spawn(consume_queue(
                kind,
                subscriber,
                Arc::clone(&self.codec),
                Arc::clone(&self.handlers),
            )));
        }

        *consumers = started;
        self.connected.store(true, Ordering::Release);
        info!(
            "Connected to exchange '{}' with {} request queues",
            self.config.exchange,
            consumers.len()
        );
        Ok(())
    }

    /// Stop all consumer tasks
    ///
    /// Best-effort and idempotent; never fails.
    pub fn disconnect(&self) {
        let consumers = std::mem::take(&mut *self.consumers.lock());
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        for consumer in &consumers {
            consumer.abort();
        }
        info!(
            "Disconnected from exchange '{}' ({} consumers stopped)",
            self.config.exchange,
            consumers.len()
        );
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Encode and publish a domain event to `routing_key`
    pub fn publish_event(
        &self,
        routing_key: &str,
        event: &DomainEvent,
    ) -> Result<(), GatewayError> {
        let payload = self.codec.encode_event(event)?;
        self.publish_bytes(routing_key, &payload)?;
        Ok(())
    }

    /// Publish an already encoded payload to `routing_key`
    pub fn publish_bytes(&self, routing_key: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.broker.publish(&self.config.exchange, routing_key, payload)
    }

    pub fn exchange(&self) -> &str {
        &self.config.exchange
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn broker(&self) -> &Arc<dyn MessageBroker> {
        &self.broker
    }

    pub fn codec(&self) -> &Arc<dyn MessageCodec> {
        &self.codec
    }
}

impl Drop for QueueTopologyManager {
    fn drop(&mut self) {
        for consumer in self.consumers.get_mut().drain(..) {
            consumer.abort();
        }
    }
}

async fn consume_queue(
    kind: InboundKind,
    mut subscriber: Box<dyn QueueSubscriber>,
    codec: Arc<dyn MessageCodec>,
    handlers: HandlerTable,
) {
    debug!("Consuming {} requests from '{}'", kind, subscriber.queue());
    loop {
        match subscriber.next().await {
            Ok(payload) => {
                let codec = Arc::clone(&codec);
                let handlers = Arc::clone(&handlers);
                let delivered = tokio::task::spawn_blocking(move || {
                    handle_delivery(kind, &payload, codec.as_ref(), &handlers)
                })
                .await;
                if let Err(e) = delivered {
                    error!("Delivery task for {} requests failed: {}", kind, e);
                }
            }
            Err(TransportError::ChannelClosed) => {
                debug!("Queue '{}' closed", subscriber.queue());
                break;
            }
            Err(e) => {
                error!("Consumer for '{}' failed: {}", subscriber.queue(), e);
                break;
            }
        }
    }
}

fn handle_delivery(
    kind: InboundKind,
    payload: &[u8],
    codec: &dyn MessageCodec,
    handlers: &HandlerTable,
) {
    let request = match codec.decode_request(kind, payload) {
        Ok(request) => request,
        Err(e) => {
            warn!("Discarding malformed {} request: {}", kind, e);
            return;
        }
    };

    // Clone out so the lock is not held while the handler runs
    let handler = handlers.read().get(&kind).cloned();
    let Some(handler) = handler else {
        debug!("No handler for {} requests, dropping", kind);
        return;
    };

    if panic::catch_unwind(AssertUnwindSafe(|| handler(request))).is_err() {
        error!("Handler for {} requests panicked", kind);
    }
}
