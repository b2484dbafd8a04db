//! Engine server lifecycle
//!
//! `EngineServer` owns one engine's moving parts: the topology manager that
//! consumes request queues, the dispatcher thread that publishes data-plane
//! replies, the heartbeat timer task and the controller in between.
//!
//! Lifecycle: `new` (dispatcher thread running, nothing consumed) ->
//! `start_server` (queues declared and consumed, heartbeat timer running)
//! -> `stop_server` (timer stopped, consumers stopped, ring drained). A
//! stopped server cannot be started again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use hermes_core::Timestamp;
use hermes_dispatcher::{CorrelatedRequest, Dispatcher, DispatcherStats};
use hermes_gateway::{JsonCodec, MessageBroker, MessageCodec, QueueTopologyManager};
use hermes_ports::{Clock, ProviderAdapter};
use log::{error, info};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::controller::EngineController;
use crate::error::{EngineError, Result};

const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// Point-in-time view of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub dispatcher: DispatcherStats,
    pub applications: usize,
    pub tracked: usize,
    pub subscriptions: usize,
    pub open_orders: usize,
    pub unroutable: u64,
}

pub struct EngineServer {
    config: EngineConfig,
    controller: Arc<EngineController>,
    topology: Arc<QueueTopologyManager>,
    dispatcher: Arc<Dispatcher>,
    heartbeat_task: Mutex<Option<JoinHandle<()>>>,
    clock: Arc<dyn Clock>,
    started_at: Mutex<Option<Timestamp>>,
    state: AtomicU8,
}

impl EngineServer {
    /// Build an engine on `broker`
    ///
    /// Validates the config and starts the dispatcher thread, which
    /// publishes every data-plane reply to the configured exchange.
    pub fn new(
        config: EngineConfig,
        broker: Arc<dyn MessageBroker>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let codec: Arc<dyn MessageCodec> = Arc::new(JsonCodec::new());
        let topology = Arc::new(QueueTopologyManager::new(
            Arc::clone(&broker),
            codec,
            config.topology(),
        ));

        let exchange = config.exchange.clone();
        let dispatcher = Arc::new(Dispatcher::start(
            config.dispatcher_config(),
            move |request: &CorrelatedRequest| {
                broker.publish(&exchange, request.destination(), request.payload())
            },
        )?);

        let controller = Arc::new(EngineController::new(
            &config,
            Arc::clone(&clock),
            Arc::clone(&topology),
            Arc::clone(&dispatcher),
        )?);
        controller.bind()?;

        Ok(Self {
            config,
            controller,
            topology,
            dispatcher,
            heartbeat_task: Mutex::new(None),
            clock,
            started_at: Mutex::new(None),
            state: AtomicU8::new(STATE_IDLE),
        })
    }

    pub fn add_provider(&self, provider: Arc<dyn ProviderAdapter>) -> Result<()> {
        self.controller.register_provider(provider)
    }

    /// Declare and consume the request queues and start the heartbeat timer
    ///
    /// Must run inside a tokio runtime. Topology failures are returned and
    /// leave the server idle.
    pub fn start_server(&self) -> Result<()> {
        match self.state.load(Ordering::Acquire) {
            STATE_RUNNING => return Err(EngineError::AlreadyRunning),
            STATE_STOPPED => return Err(EngineError::Stopped),
            _ => {}
        }

        self.topology.connect()?;
        if self
            .state
            .compare_exchange(STATE_IDLE, STATE_RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::AlreadyRunning);
        }
        *self.heartbeat_task.lock() = Some(self.controller.heartbeat().start());
        *self.started_at.lock() = Some(self.clock.now());

        info!(
            "Engine '{}' ({:?}) started on exchange '{}' with providers {:?}",
            self.config.name,
            self.config.kind,
            self.config.exchange,
            self.controller.provider_names()
        );
        Ok(())
    }

    /// Stop consuming, stop the timer and drain the dispatcher
    ///
    /// Never fails; calling it again is a no-op.
    pub fn stop_server(&self) {
        if self.state.swap(STATE_STOPPED, Ordering::AcqRel) == STATE_STOPPED {
            return;
        }

        if let Some(task) = self.heartbeat_task.lock().take() {
            task.abort();
        }
        self.topology.disconnect();
        self.dispatcher.shutdown();

        let stats = self.dispatcher.stats();
        if stats.failed > 0 {
            error!(
                "Engine '{}' stopped with {} failed publishes",
                self.config.name, stats.failed
            );
        }
        let started_at = *self.started_at.lock();
        let uptime = started_at
            .map(|started| self.clock.since(started).num_seconds())
            .unwrap_or(0);
        info!(
            "Engine '{}' stopped after {}s: {} replies dispatched",
            self.config.name, uptime, stats.dispatched
        );
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn controller(&self) -> &Arc<EngineController> {
        &self.controller
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            dispatcher: self.dispatcher.stats(),
            applications: self.controller.directory().len(),
            tracked: self.controller.heartbeat().tracked(),
            subscriptions: self.controller.subscription_count(),
            open_orders: self.controller.open_orders(),
            unroutable: self.controller.unroutable(),
        }
    }
}

impl Drop for EngineServer {
    fn drop(&mut self) {
        self.stop_server();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_clock::ManualClock;
    use hermes_gateway::{InMemoryBroker, RecordingBroker};

    fn server(config: EngineConfig) -> Result<EngineServer> {
        EngineServer::new(
            config,
            Arc::new(RecordingBroker::new()),
            ManualClock::starting_now(),
        )
    }

    #[test]
    fn test_invalid_config_is_rejected_before_start() {
        let config = EngineConfig::default().with_ring_capacity(3);

        assert!(matches!(server(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_start_outside_runtime_fails_and_stays_idle() {
        let server = server(EngineConfig::default()).unwrap();

        assert!(matches!(
            server.start_server(),
            Err(EngineError::Gateway(_))
        ));
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_lifecycle_runs_once() {
        let server = server(EngineConfig::default()).unwrap();

        server.start_server().unwrap();
        assert!(server.is_running());
        assert!(matches!(
            server.start_server(),
            Err(EngineError::AlreadyRunning)
        ));

        server.stop_server();
        server.stop_server();
        assert!(!server.is_running());
        assert!(matches!(server.start_server(), Err(EngineError::Stopped)));
    }

    #[tokio::test]
    async fn test_declare_failure_propagates_from_start() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.close().unwrap();
        let server = EngineServer::new(
            EngineConfig::default(),
            broker,
            ManualClock::starting_now(),
        )
        .unwrap();

        assert!(matches!(
            server.start_server(),
            Err(EngineError::Gateway(_))
        ));
        assert!(!server.is_running());
    }
}
