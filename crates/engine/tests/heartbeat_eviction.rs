//! Heartbeat keep-alives and eviction as seen from the engine

mod common;

use std::time::Duration as StdDuration;

use chrono::Duration;
use common::{Harness, app};
use hermes_core::{DomainEvent, Heartbeat, Login, MessageType, Subscribe, SubscriptionKind};
use hermes_engine::{EngineConfig, EngineKind};
use hermes_gateway::InboundRequest;

#[tokio::test]
async fn test_silent_application_is_evicted_once_and_cleaned_up() {
    let h = Harness::start(EngineKind::MarketData);
    h.send(InboundRequest::Login(Login::new("app-1", "Sim")));
    h.register_all("app-1");
    h.send(InboundRequest::Subscribe(Subscribe::ticks("app-1", "Sim", "AAPL")));
    let heartbeat = h.server.controller().heartbeat();

    h.clock.advance(Duration::milliseconds(61_000));
    let outcome = heartbeat.tick(h.now());
    assert_eq!(outcome.evicted, vec![app("app-1")]);

    let controller = h.server.controller();
    assert!(!controller.directory().contains(&app("app-1")));
    assert!(!h.provider.is_subscribed("AAPL", SubscriptionKind::Tick));
    assert_eq!(controller.subscription_count(), 0);

    assert!(heartbeat.tick(h.now()).evicted.is_empty());
}

#[tokio::test]
async fn test_heartbeats_keep_application_alive_and_get_replies() {
    let h = Harness::start(EngineKind::MarketData);
    h.register("app-1", &[(MessageType::Admin, "app-1.admin")]);
    let heartbeat = h.server.controller().heartbeat();

    for _ in 0..5 {
        h.clock.advance(Duration::milliseconds(40_000));
        h.send(InboundRequest::Heartbeat(Heartbeat::new("app-1", h.now())));
        let outcome = heartbeat.tick(h.now());
        assert!(outcome.evicted.is_empty());
        assert_eq!(outcome.responded, 1);
    }

    let replies = h.heartbeats_to("app-1.admin");
    assert_eq!(replies.len(), 5);
    assert!(
        replies
            .iter()
            .all(|event| matches!(event, DomainEvent::Heartbeat(r) if r.app_id == app("app-1")))
    );
}

#[tokio::test]
async fn test_heartbeat_from_unknown_application_is_not_tracked() {
    let h = Harness::start(EngineKind::MarketData);

    h.send(InboundRequest::Heartbeat(Heartbeat::new("stranger", h.now())));

    assert_eq!(h.server.controller().heartbeat().tracked(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timer_evicts_without_manual_ticks() {
    let config = EngineConfig::for_kind(EngineKind::MarketData).with_heartbeat(5_000, 1_000);
    let h = Harness::start_with(config);
    h.register_all("app-1");

    h.clock.advance(Duration::milliseconds(6_000));
    tokio::time::sleep(StdDuration::from_millis(1_500)).await;

    assert!(!h.server.controller().directory().contains(&app("app-1")));
    assert_eq!(h.server.stats().tracked, 0);
}

#[tokio::test]
async fn test_lagging_client_clock_does_not_evict_live_application() {
    let h = Harness::start(EngineKind::MarketData);
    h.register_all("app-1");
    let heartbeat = h.server.controller().heartbeat();

    for _ in 0..8 {
        h.clock.advance(Duration::milliseconds(10_000));
        let stamped = h.now() - Duration::milliseconds(70_000);
        h.send(InboundRequest::Heartbeat(Heartbeat::new("app-1", stamped)));
        assert!(heartbeat.tick(h.now()).evicted.is_empty());
    }
    assert!(h.server.controller().directory().contains(&app("app-1")));
}

#[tokio::test]
async fn test_leading_client_clock_does_not_keep_silent_application_alive() {
    let h = Harness::start(EngineKind::MarketData);
    h.register_all("app-1");
    let stamped = h.now() + Duration::hours(1);
    h.send(InboundRequest::Heartbeat(Heartbeat::new("app-1", stamped)));

    h.clock.advance(Duration::milliseconds(61_000));

    let outcome = h.server.controller().heartbeat().tick(h.now());
    assert_eq!(outcome.evicted, vec![app("app-1")]);
}
