//! Integration tests over a real socket.
//!
//! The runtime router is served on an ephemeral port and clients connect
//! with the tokio-tungstenite connector.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use futures::StreamExt;
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

use project_pulse::adapters::access::InMemoryProjectAccess;
use project_pulse::adapters::auth::MockSessionValidator;
use project_pulse::adapters::storage::InMemoryRecordStore;
use project_pulse::application::RealtimeRuntime;
use project_pulse::client::{ClientError, ConnectionStatus, SubscriptionManager, WsConnector};
use project_pulse::domain::foundation::{ProjectId, TenantId, UserId};
use project_pulse::domain::realtime::{EmitContext, EntityKind, MutatedRecord};
use project_pulse::ports::RecordStore;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn runtime() -> RealtimeRuntime {
    let access = Arc::new(InMemoryProjectAccess::new().with_grant("u1", "p1"));
    let validator = Arc::new(MockSessionValidator::new().with_test_user("tok-u1", "u1"));
    RealtimeRuntime::builder(validator, access).start()
}

async fn serve(runtime: &RealtimeRuntime) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = runtime.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn connector(addr: SocketAddr) -> Arc<WsConnector> {
    Arc::new(WsConnector::new(format!("ws://{}/realtime", addr)))
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn task_write_is_delivered_over_websocket() {
    let runtime = runtime();
    let addr = serve(&runtime).await;

    let manager = SubscriptionManager::new(connector(addr));
    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.on("task.created", move |frame| {
        let _ = tx.send(frame.clone());
    });

    let connected = manager.connect("tok-u1").await.unwrap();
    assert_eq!(connected.user_id, "u1");
    assert_eq!(manager.current_status(), ConnectionStatus::Connected);
    assert!(manager
        .join_project_room(&ProjectId::new("p1").unwrap())
        .await
        .unwrap());

    let records: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let store = runtime.auto_emit_store(records, TenantId::new("acme").unwrap());
    store
        .create(
            EntityKind::Task,
            MutatedRecord::new("t1").with_project(ProjectId::new("p1").unwrap()),
            Some(EmitContext::for_actor(UserId::new("u1").unwrap())),
        )
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame.event, "task.created");
    assert_eq!(frame.room, "project:p1");
    assert_eq!(frame.payload["taskId"], "t1");

    manager.disconnect().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn invalid_token_is_rejected_before_upgrade() {
    let runtime = runtime();
    let addr = serve(&runtime).await;

    let manager = SubscriptionManager::new(connector(addr));
    let err = manager.connect("forged").await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert!(err.requires_reauthentication());
    assert_eq!(manager.current_status(), ConnectionStatus::Disconnected);
    assert_eq!(runtime.room_manager().connection_count(), 0);
}

#[tokio::test]
async fn query_token_handshake_sends_connected_frame() {
    let runtime = runtime();
    let addr = serve(&runtime).await;

    let url = format!("ws://{}/realtime?token=tok-u1", addr);
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let Message::Text(text) = first else {
        panic!("expected a text frame, got {:?}", first);
    };
    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["type"], "connected");
    assert_eq!(json["userId"], "u1");
    assert_eq!(json["rooms"][0], "user:u1");
}

#[tokio::test]
async fn health_reports_connection_count() {
    let runtime = runtime();

    let response = runtime
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["connections"], 0);
}
