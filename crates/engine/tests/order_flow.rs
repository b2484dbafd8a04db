//! Order execution engine: orders, cancels, locates and positions are
//! routed back to the application that owns them

mod common;

use common::{Harness, app};
use hermes_core::{
    CancelOrder, DomainEvent, LocateOrder, LocateResponse, Login, Order, OrderStatus, Position,
    Rejection, RejectionKind, Side,
};
use hermes_engine::EngineKind;
use hermes_gateway::InboundRequest;
use hermes_ports::ProviderEvents;
use rust_decimal_macros::dec;

fn logged_in(apps: &[&str]) -> Harness {
    let h = Harness::start(EngineKind::OrderExecution);
    for id in apps {
        h.register_all(id);
    }
    h.send(InboundRequest::Login(Login::new(apps[0], "Sim")));
    h
}

fn cancel(order: &Order, app_id: &str) -> CancelOrder {
    CancelOrder {
        order_id: order.id,
        app_id: app(app_id),
        provider: "Sim".to_string(),
    }
}

#[tokio::test]
async fn test_market_order_acknowledged_and_filled() {
    let h = logged_in(&["app-1"]);
    h.provider.set_price("AAPL", dec!(150));
    let order = Order::market("app-1", "Sim", "AAPL", Side::Buy, dec!(10));

    h.send(InboundRequest::MarketOrder(order.clone()));
    h.drain();

    match &h.events_to("app-1.order")[..] {
        [DomainEvent::OrderAccepted(accepted)] => {
            assert_eq!(accepted.id, order.id);
            assert_eq!(accepted.status, OrderStatus::New);
        }
        other => panic!("unexpected order events: {:?}", other),
    }
    match &h.events_to("app-1.execution")[..] {
        [DomainEvent::Execution(execution)] => {
            assert_eq!(execution.order_id, order.id);
            assert_eq!(execution.price, dec!(150));
            assert!(execution.is_complete());
        }
        other => panic!("unexpected executions: {:?}", other),
    }
    // Fully filled orders are forgotten
    assert_eq!(h.server.controller().order_owner(&order.id), None);
}

#[tokio::test]
async fn test_order_to_unknown_provider_is_rejected() {
    let h = logged_in(&["app-1"]);
    let order = Order::market("app-1", "Elsewhere", "AAPL", Side::Buy, dec!(1));

    h.send(InboundRequest::MarketOrder(order.clone()));
    h.drain();

    match &h.events_to("app-1.rejection")[..] {
        [DomainEvent::Rejection(rejection)] => {
            assert_eq!(rejection.order_id, order.id);
            assert_eq!(rejection.reason, "unknown provider");
        }
        other => panic!("unexpected rejections: {:?}", other),
    }
    assert_eq!(h.server.controller().open_orders(), 0);
}

#[tokio::test]
async fn test_provider_refusal_becomes_rejection() {
    let h = logged_in(&["app-1"]);
    let order = Order::market("app-1", "Sim", "AAPL", Side::Buy, dec!(0));

    h.send(InboundRequest::MarketOrder(order));
    h.drain();

    assert_eq!(h.events_to("app-1.rejection").len(), 1);
    assert!(h.events_to("app-1.order").is_empty());
}

#[tokio::test]
async fn test_resting_limit_order_can_be_cancelled() {
    let h = logged_in(&["app-1"]);
    h.provider.set_price("AAPL", dec!(150));
    let order = Order::limit("app-1", "Sim", "AAPL", Side::Buy, dec!(5), dec!(140));

    h.send(InboundRequest::LimitOrder(order.clone()));
    assert_eq!(
        h.server.controller().order_owner(&order.id),
        Some(app("app-1"))
    );
    h.send(InboundRequest::CancelOrder(cancel(&order, "app-1")));
    h.drain();

    let events = h.events_to("app-1.order");
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], DomainEvent::OrderAccepted(o) if o.id == order.id));
    assert!(
        matches!(&events[1], DomainEvent::OrderCancelled(o) if o.status == OrderStatus::Cancelled)
    );
    assert_eq!(h.server.controller().open_orders(), 0);
}

#[tokio::test]
async fn test_cancel_of_foreign_order_is_rejected_to_requester() {
    let h = logged_in(&["app-1", "app-2"]);
    let order = Order::limit("app-1", "Sim", "AAPL", Side::Sell, dec!(5), dec!(500));
    h.send(InboundRequest::LimitOrder(order.clone()));

    h.send(InboundRequest::CancelOrder(cancel(&order, "app-2")));
    h.drain();

    assert_eq!(h.events_to("app-2.rejection").len(), 1);
    assert_eq!(h.provider.resting_orders(), 1);
    assert_eq!(
        h.server.controller().order_owner(&order.id),
        Some(app("app-1"))
    );
}

#[tokio::test]
async fn test_resting_order_fill_reaches_owner_after_price_move() {
    let h = logged_in(&["app-1", "app-2"]);
    h.provider.set_price("AAPL", dec!(150));
    let order = Order::limit("app-2", "Sim", "AAPL", Side::Buy, dec!(5), dec!(149));
    h.send(InboundRequest::LimitOrder(order.clone()));

    h.provider.set_price("AAPL", dec!(148));
    h.drain();

    assert_eq!(h.events_to("app-2.execution").len(), 1);
    assert!(h.events_to("app-1.execution").is_empty());
}

#[tokio::test]
async fn test_locates_and_positions_use_their_destinations() {
    let h = logged_in(&["app-1"]);

    h.provider.send_locate(LocateOrder {
        locate_id: "loc-1".to_string(),
        app_id: app("app-1"),
        provider: "Sim".to_string(),
        symbol: "TSLA".to_string(),
        quantity: dec!(100),
        price: dec!(0.02),
    });
    h.provider.send_position(Position {
        app_id: app("app-1"),
        provider: "Sim".to_string(),
        symbol: "TSLA".to_string(),
        quantity: dec!(-100),
        average_price: dec!(250),
    });
    h.send(InboundRequest::LocateResponse(LocateResponse {
        locate_id: "loc-1".to_string(),
        app_id: app("app-1"),
        provider: "Sim".to_string(),
        accepted: true,
    }));

    assert!(matches!(
        &h.events_to("app-1.locate")[..],
        [DomainEvent::Locate(locate)] if locate.locate_id == "loc-1"
    ));
    assert!(matches!(
        &h.events_to("app-1.order")[..],
        [DomainEvent::Position(position)] if position.is_short()
    ));
}

#[tokio::test]
async fn test_refused_cancel_keeps_order_owned_for_later_fills() {
    let h = logged_in(&["app-1"]);
    h.provider.set_price("AAPL", dec!(100));
    let order = Order::limit("app-1", "Sim", "AAPL", Side::Buy, dec!(5), dec!(90));
    h.send(InboundRequest::LimitOrder(order.clone()));

    h.server.controller().on_order_rejected(Rejection {
        order_id: order.id,
        provider: "Sim".to_string(),
        reason: "cancel window closed".to_string(),
        kind: RejectionKind::Cancel,
        timestamp: h.now(),
    });
    assert_eq!(
        h.server.controller().order_owner(&order.id),
        Some(app("app-1"))
    );

    h.provider.set_price("AAPL", dec!(89));
    h.drain();

    assert_eq!(h.events_to("app-1.rejection").len(), 1);
    assert!(matches!(
        &h.events_to("app-1.execution")[..],
        [DomainEvent::Execution(execution)] if execution.order_id == order.id
    ));
}

#[tokio::test]
async fn test_cancel_after_fill_is_rejected_to_requester() {
    let h = logged_in(&["app-1"]);
    h.provider.set_price("AAPL", dec!(150));
    let order = Order::market("app-1", "Sim", "AAPL", Side::Buy, dec!(10));
    h.send(InboundRequest::MarketOrder(order.clone()));
    assert_eq!(h.server.controller().order_owner(&order.id), None);

    h.send(InboundRequest::CancelOrder(cancel(&order, "app-1")));
    h.drain();

    match &h.events_to("app-1.rejection")[..] {
        [DomainEvent::Rejection(rejection)] => {
            assert_eq!(rejection.order_id, order.id);
            assert_eq!(rejection.kind, RejectionKind::Cancel);
        }
        other => panic!("unexpected rejections: {:?}", other),
    }
}
