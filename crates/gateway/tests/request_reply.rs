//! Request/reply over the in-process broker
//!
//! A client application and an engine-side topology manager share one
//! exchange: the client publishes requests on the engine's routing keys and
//! listens on its own reply routing keys.
//!
//! Run with: cargo test -p hermes-gateway --test request_reply

use std::sync::Arc;
use std::time::Duration;

use hermes_core::{AppInfo, DomainEvent, Inquiry, InquiryResponse, MessageType};
use hermes_gateway::{
    InboundKind, InboundRequest, JsonCodec, MessageBroker, MessageCodec, QueueTopologyManager,
    RecordingBroker, TopologyConfig,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

const EXCHANGE: &str = "hermes";

#[tokio::test]
async fn test_client_request_and_engine_reply() {
    let _ = env_logger::try_init();

    let broker = Arc::new(RecordingBroker::new());
    let codec = JsonCodec::new();
    let manager = Arc::new(QueueTopologyManager::new(
        broker.clone(),
        Arc::new(codec),
        TopologyConfig::market_data(EXCHANGE),
    ));

    // Engine side: answer AppId inquiries on the reply key they carry
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    {
        let replier = Arc::clone(&manager);
        manager
            .on_request(InboundKind::Inquiry, move |request| {
                if let InboundRequest::Inquiry(Inquiry {
                    reply_to: Some(reply_to),
                    ..
                }) = &request
                {
                    let response = DomainEvent::InquiryResponse(InquiryResponse::app_id(
                        "generated-1".into(),
                    ));
                    replier.publish_event(reply_to, &response).unwrap();
                }
                let _ = seen_tx.send(request);
            })
            .unwrap();
    }
    manager.connect().unwrap();

    // Client side: private reply queue bound to its reply key
    broker.declare_queue("client-1.replies").unwrap();
    broker
        .bind_queue("client-1.replies", EXCHANGE, "client-1.admin")
        .unwrap();
    let mut replies = broker.consume("client-1.replies").unwrap();

    let inquiry = InboundRequest::Inquiry(Inquiry::app_id("client-1.admin"));
    let routing_key = manager.config().routing_key(InboundKind::Inquiry).unwrap();
    broker
        .publish(EXCHANGE, routing_key, &codec.encode_request(&inquiry).unwrap())
        .unwrap();

    let seen = timeout(Duration::from_secs(1), seen_rx.recv()).await.unwrap();
    assert_eq!(seen, Some(inquiry));

    let payload = timeout(Duration::from_secs(1), replies.next())
        .await
        .unwrap()
        .unwrap();
    match codec.decode_event(&payload).unwrap() {
        DomainEvent::InquiryResponse(response) => {
            assert_eq!(response.app_id.unwrap().as_str(), "generated-1");
        }
        other => panic!("unexpected reply: {other:?}"),
    }
    assert_eq!(broker.published_to("client-1.admin").len(), 1);

    manager.disconnect();
}

#[tokio::test]
async fn test_unhandled_kind_is_consumed_and_dropped() {
    let broker = Arc::new(RecordingBroker::new());
    let codec = JsonCodec::new();
    let manager = QueueTopologyManager::new(
        broker.clone(),
        Arc::new(codec),
        TopologyConfig::market_data(EXCHANGE),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager
        .on_request(InboundKind::AppInfo, move |request| {
            let _ = tx.send(request);
        })
        .unwrap();
    manager.connect().unwrap();

    // No handler for logout; the delivery must not wedge anything
    let logout = InboundRequest::Logout(hermes_core::Logout::new("X123", "Sim"));
    broker
        .publish(EXCHANGE, "md.logout", &codec.encode_request(&logout).unwrap())
        .unwrap();

    let app_info = InboundRequest::AppInfo(
        AppInfo::new("X123").with_destination(MessageType::Admin, "A"),
    );
    broker
        .publish(EXCHANGE, "md.app_info", &codec.encode_request(&app_info).unwrap())
        .unwrap();

    let received = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(received, Some(app_info));
}
