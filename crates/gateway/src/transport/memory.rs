//! In-process broker for single-process deployments and tests
//!
//! Each queue holds a backlog plus at most one live consumer channel.
//! Publishes go straight to the consumer when one is attached and pile up
//! in the backlog otherwise; the backlog is flushed to the next consumer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::transport::{ExchangeKind, MessageBroker, QueueSubscriber};

#[derive(Default)]
struct QueueState {
    backlog: VecDeque<Vec<u8>>,
    consumer: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl QueueState {
    fn deliver(&mut self, payload: Vec<u8>) {
        if let Some(consumer) = &self.consumer {
            match consumer.send(payload) {
                Ok(()) => return,
                Err(mpsc::error::SendError(payload)) => {
                    // Subscriber went away; keep the message for the next one
                    self.consumer = None;
                    self.backlog.push_back(payload);
                }
            }
        } else {
            self.backlog.push_back(payload);
        }
    }

    fn has_live_consumer(&self) -> bool {
        self.consumer.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

struct ExchangeState {
    kind: ExchangeKind,
    bindings: Vec<(String, String)>, // (queue, routing key)
}

impl ExchangeState {
    fn targets(&self, routing_key: &str) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|(_, key)| self.kind == ExchangeKind::Fanout || key == routing_key)
            .map(|(queue, _)| queue.clone())
            .collect()
    }
}

/// Broker living entirely inside this process
#[derive(Default)]
pub struct InMemoryBroker {
    exchanges: DashMap<String, ExchangeState>,
    queues: DashMap<String, Mutex<QueueState>>,
    closed: AtomicBool,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting in a queue with no consumer attached
    pub fn queue_depth(&self, queue: &str) -> Option<usize> {
        self.queues.get(queue).map(|state| state.lock().backlog.len())
    }

    pub fn has_queue(&self, queue: &str) -> bool {
        self.queues.contains_key(queue)
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::ChannelClosed);
        }
        Ok(())
    }
}

impl MessageBroker for InMemoryBroker {
    fn declare_exchange(&self, exchange: &str, kind: ExchangeKind) -> Result<(), TransportError> {
        self.ensure_open()?;
        if exchange.is_empty() {
            return Err(TransportError::Declare(
                "exchange name must not be empty".to_string(),
            ));
        }

        let existing = self
            .exchanges
            .entry(exchange.to_string())
            .or_insert_with(|| ExchangeState {
                kind,
                bindings: Vec::new(),
            });
        if existing.kind != kind {
            return Err(TransportError::Declare(format!(
                "exchange '{}' already declared as {:?}",
                exchange, existing.kind
            )));
        }
        Ok(())
    }

    fn declare_queue(&self, queue: &str) -> Result<(), TransportError> {
        self.ensure_open()?;
        if queue.is_empty() {
            return Err(TransportError::Declare(
                "queue name must not be empty".to_string(),
            ));
        }
        self.queues.entry(queue.to_string()).or_default();
        Ok(())
    }

    fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        if !self.queues.contains_key(queue) {
            return Err(TransportError::UnknownQueue(queue.to_string()));
        }
        let mut state = self
            .exchanges
            .get_mut(exchange)
            .ok_or_else(|| TransportError::UnknownExchange(exchange.to_string()))?;

        let binding = (queue.to_string(), routing_key.to_string());
        if !state.bindings.contains(&binding) {
            state.bindings.push(binding);
        }
        Ok(())
    }

    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.ensure_open()?;
        let targets = self
            .exchanges
            .get(exchange)
            .map(|state| state.targets(routing_key))
            .ok_or_else(|| TransportError::UnknownExchange(exchange.to_string()))?;

        if targets.is_empty() {
            debug!(
                "Unroutable message on '{}' with routing key '{}'",
                exchange, routing_key
            );
            return Ok(());
        }

        for queue in targets {
            if let Some(state) = self.queues.get(&queue) {
                state.lock().deliver(payload.to_vec());
            }
        }
        Ok(())
    }

    fn consume(&self, queue: &str) -> Result<Box<dyn QueueSubscriber>, TransportError> {
        self.ensure_open()?;
        let state = self
            .queues
            .get(queue)
            .ok_or_else(|| TransportError::UnknownQueue(queue.to_string()))?;
        let mut state = state.lock();

        if state.has_live_consumer() {
            return Err(TransportError::Subscribe(format!(
                "queue '{}' already has a consumer",
                queue
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        for payload in state.backlog.drain(..) {
            // Receiver is alive in this scope
            let _ = tx.send(payload);
        }
        state.consumer = Some(tx);

        Ok(Box::new(ChannelQueueSubscriber {
            queue: queue.to_string(),
            rx,
        }))
    }

    fn delete_queue(&self, queue: &str) -> Result<(), TransportError> {
        self.queues.remove(queue);
        for mut exchange in self.exchanges.iter_mut() {
            exchange.bindings.retain(|(bound, _)| bound != queue);
        }
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.queues.clear();
        self.exchanges.clear();
        debug!("In-memory broker closed");
        Ok(())
    }
}

/// Subscriber over one in-memory queue
pub struct ChannelQueueSubscriber {
    queue: String,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[async_trait]
impl QueueSubscriber for ChannelQueueSubscriber {
    fn queue(&self) -> &str {
        &self.queue
    }

    async fn next(&mut self) -> Result<Vec<u8>, TransportError> {
        self.rx.recv().await.ok_or(TransportError::ChannelClosed)
    }

    fn try_next(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.rx.try_recv() {
            Ok(payload) => Ok(Some(payload)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(TransportError::ChannelClosed),
        }
    }
}
