//! Shared harness: one running engine on a recording broker, with a
//! simulated provider named "Sim" and a frozen clock

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hermes_clock::ManualClock;
use hermes_core::{AppInfo, ApplicationId, DomainEvent, MessageType, Timestamp};
use hermes_engine::{EngineConfig, EngineKind, EngineServer, SimulatedProvider};
use hermes_gateway::{InboundRequest, JsonCodec, MessageBroker, MessageCodec, RecordingBroker};
use hermes_ports::Clock;

pub struct Harness {
    pub broker: Arc<RecordingBroker>,
    pub clock: Arc<ManualClock>,
    pub provider: Arc<SimulatedProvider>,
    pub server: EngineServer,
}

impl Harness {
    /// Started engine whose heartbeat timer stays out of the way
    pub fn start(kind: EngineKind) -> Self {
        let config = EngineConfig::for_kind(kind).with_heartbeat(60_000, 30_000);
        Self::start_with(config)
    }

    pub fn start_with(mut config: EngineConfig) -> Self {
        let _ = env_logger::try_init();
        config.app_id_prefix = Some("test".to_string());

        let broker = Arc::new(RecordingBroker::new());
        let clock = ManualClock::starting_now();
        let server = EngineServer::new(config, broker.clone(), clock.clone()).unwrap();
        let provider = Arc::new(SimulatedProvider::new("Sim", clock.clone()));
        server.add_provider(provider.clone()).unwrap();
        server.start_server().unwrap();

        Self {
            broker,
            clock,
            provider,
            server,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Hand a request to the controller as a queue consumer would
    pub fn send(&self, request: InboundRequest) {
        self.server.controller().handle_request(request);
    }

    /// Publish a request onto its queue, as a client application would
    pub fn publish_request(&self, request: &InboundRequest) {
        let config = self.server.config();
        let routing_key = config
            .topology()
            .routing_key(request.kind())
            .unwrap()
            .to_string();
        let payload = JsonCodec::new().encode_request(request).unwrap();
        self.broker
            .publish(&config.exchange, &routing_key, &payload)
            .unwrap();
    }

    /// Register `app_id` with one destination per message class
    pub fn register(&self, app_id: &str, destinations: &[(MessageType, &str)]) {
        let info = destinations
            .iter()
            .fold(AppInfo::new(app_id), |info, (message_type, key)| {
                info.with_destination(*message_type, *key)
            });
        self.send(InboundRequest::AppInfo(info));
    }

    /// Register `app_id` with `{app_id}.{class}` destinations for every class
    pub fn register_all(&self, app_id: &str) {
        let info = MessageType::ALL.iter().fold(AppInfo::new(app_id), |info, mt| {
            info.with_destination(*mt, format!("{}.{}", app_id, mt))
        });
        self.send(InboundRequest::AppInfo(info));
    }

    /// Stop the engine so every dispatched reply has reached the broker
    pub fn drain(&self) {
        self.server.stop_server();
    }

    fn decoded(&self, routing_key: &str) -> Vec<DomainEvent> {
        let codec = JsonCodec::new();
        self.broker
            .published_to(routing_key)
            .iter()
            .map(|m| codec.decode_event(&m.payload).unwrap())
            .collect()
    }

    /// Everything published to `routing_key` except timer keep-alives
    pub fn events_to(&self, routing_key: &str) -> Vec<DomainEvent> {
        self.decoded(routing_key)
            .into_iter()
            .filter(|event| !matches!(event, DomainEvent::Heartbeat(_)))
            .collect()
    }

    pub fn heartbeats_to(&self, routing_key: &str) -> Vec<DomainEvent> {
        self.decoded(routing_key)
            .into_iter()
            .filter(|event| matches!(event, DomainEvent::Heartbeat(_)))
            .collect()
    }

    /// Poll until `condition` holds or two seconds pass
    pub async fn wait_until<F: Fn(&Self) -> bool>(&self, condition: F) -> bool {
        for _ in 0..400 {
            if condition(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        condition(self)
    }
}

pub fn app(id: &str) -> ApplicationId {
    ApplicationId::from(id)
}
