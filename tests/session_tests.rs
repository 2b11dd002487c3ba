// Integration tests for sessions and the registry
//
// Timing tests run on a paused clock so tick counts are exact.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use vrm_relay::error::{Delivery, DropReason, RelayError};
use vrm_relay::session::{Egress, IdentityPolicy, ParameterPayload, Session, SessionRegistry, SessionState};

const PERIOD: Duration = Duration::from_millis(100);

/// Egress that records every payload it is handed
struct Recorder {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Egress for Recorder {
    async fn transmit(&self, text: String) -> bool {
        self.tx.send(text).is_ok()
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

fn recording_session(identity: &str) -> (Arc<Session>, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Session::new(identity, Arc::new(Recorder { tx }))), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut payloads = Vec::new();
    while let Ok(text) = rx.try_recv() {
        payloads.push(serde_json::from_str(&text).unwrap());
    }
    payloads
}

#[tokio::test(start_paused = true)]
async fn test_synthetic_loop_first_ticks() {
    let (session, mut rx) = recording_session("user_b");

    session.start_synthetic_loop(PERIOD).await.unwrap();
    assert_eq!(session.state().await, SessionState::Generating);

    tokio::time::sleep(Duration::from_millis(250)).await;

    let payloads = drain(&mut rx);
    assert_eq!(payloads.len(), 2, "expected ticks at 100ms and 200ms");

    assert_eq!(payloads[0]["userId"], "user_b");
    assert_eq!(payloads[0]["parameters"]["mouthOpen"], 0.5);
    assert_eq!(payloads[0]["parameters"]["headYaw"], 20.0);

    assert_eq!(payloads[1]["parameters"]["mouthOpen"], 0.55);
    assert_eq!(payloads[1]["parameters"]["headYaw"], 19.98);

    session.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_tick_after_stop() {
    let (session, mut rx) = recording_session("user_b");

    session.start_synthetic_loop(PERIOD).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.stop().await;

    assert_eq!(drain(&mut rx).len(), 1);
    assert_eq!(session.state().await, SessionState::Idle);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(drain(&mut rx).is_empty(), "tick delivered after stop returned");
}

#[tokio::test(start_paused = true)]
async fn test_restart_resets_phase() {
    let (session, mut rx) = recording_session("user_b");

    session.start_synthetic_loop(PERIOD).await.unwrap();
    tokio::time::sleep(Duration::from_millis(350)).await;
    session.stop().await;
    assert_eq!(drain(&mut rx).len(), 3);

    session.start_synthetic_loop(PERIOD).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let payloads = drain(&mut rx);
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["parameters"]["headYaw"], 20.0);

    session.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_noop() {
    let (session, mut rx) = recording_session("user_b");

    session.start_synthetic_loop(PERIOD).await.unwrap();
    session.start_synthetic_loop(PERIOD).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // One generator, one tick
    assert_eq!(drain(&mut rx).len(), 1);

    session.stop().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let (session, _rx) = recording_session("vrm_user_a");

    session.stop().await;
    assert_eq!(session.state().await, SessionState::Created);

    session.start_synthetic_loop(PERIOD).await.unwrap();
    session.stop().await;
    session.stop().await;
    assert_eq!(session.state().await, SessionState::Idle);
}

#[tokio::test]
async fn test_closed_session_cannot_generate() {
    let (session, _rx) = recording_session("user_b");

    session.close().await;
    assert_eq!(session.state().await, SessionState::Stopped);

    let result = session.start_synthetic_loop(PERIOD).await;
    assert!(matches!(result, Err(RelayError::SessionClosed(id)) if id == "user_b"));
}

#[tokio::test]
async fn test_send_to_closed_transport_is_dropped() {
    let (session, rx) = recording_session("vrm_user_a");
    drop(rx);

    let delivery = session.send(&ParameterPayload::new("vrm_user_a")).await;
    assert_eq!(
        delivery,
        Delivery::Dropped(DropReason::TransportClosed("vrm_user_a".to_string()))
    );
    assert_eq!(session.info().await.payloads_sent, 0);
}

#[tokio::test]
async fn test_register_send_remove_send() {
    let registry = SessionRegistry::new();
    let (session, mut rx) = recording_session("vrm_user_a");

    registry.register("vrm_user_a", session).await;
    let payload = ParameterPayload::new("vrm_user_a").with_parameter("mouthOpen", 0.3);

    assert!(registry.route("vrm_user_a", &payload).await.is_sent());

    registry.remove("vrm_user_a").await;
    assert_eq!(
        registry.route("vrm_user_a", &payload).await,
        Delivery::Dropped(DropReason::NoRoute("vrm_user_a".to_string()))
    );

    assert_eq!(drain(&mut rx).len(), 1);
}

#[tokio::test]
async fn test_remove_absent_identity() {
    let registry = SessionRegistry::new();
    assert!(registry.remove("nobody").await.is_none());
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_register_replaces() {
    let registry = SessionRegistry::new();
    let (first, mut first_rx) = recording_session("vrm_user_a");
    let (second, mut second_rx) = recording_session("vrm_user_a");

    assert!(registry.register("vrm_user_a", first).await.is_none());
    assert!(registry.register("vrm_user_a", second).await.is_some());
    assert_eq!(registry.len().await, 1);

    registry
        .route("vrm_user_a", &ParameterPayload::new("vrm_user_a"))
        .await;

    assert!(drain(&mut first_rx).is_empty());
    assert_eq!(drain(&mut second_rx).len(), 1);
}

#[tokio::test]
async fn test_admit_assigns_by_connection_order() {
    let registry = SessionRegistry::new();
    let policy = IdentityPolicy::default();
    let (tx, _rx) = mpsc::unbounded_channel();
    let egress: Arc<dyn Egress> = Arc::new(Recorder { tx });

    let (first, _) = registry
        .admit(&policy, |id| Session::new(id, Arc::clone(&egress)))
        .await;
    let (second, _) = registry
        .admit(&policy, |id| Session::new(id, Arc::clone(&egress)))
        .await;
    let (third, displaced) = registry
        .admit(&policy, |id| Session::new(id, Arc::clone(&egress)))
        .await;

    assert_eq!(first.identity(), "vrm_user_a");
    assert_eq!(second.identity(), "user_b");
    assert_eq!(third.identity(), "user_b");
    assert!(Arc::ptr_eq(&displaced.unwrap(), &second));
    assert_eq!(registry.identities().await, vec!["user_b", "vrm_user_a"]);
}

#[tokio::test]
async fn test_release_keeps_replacement() {
    let registry = SessionRegistry::new();
    let (old, _old_rx) = recording_session("user_b");
    let (new, _new_rx) = recording_session("user_b");

    registry.register("user_b", Arc::clone(&old)).await;
    registry.register("user_b", Arc::clone(&new)).await;

    assert!(!registry.release("user_b", &old).await);
    assert!(registry.contains("user_b").await);

    assert!(registry.release("user_b", &new).await);
    assert!(!registry.contains("user_b").await);
}

#[tokio::test]
async fn test_infos_are_sorted() {
    let registry = SessionRegistry::new();
    let (a, _a_rx) = recording_session("vrm_user_a");
    let (b, _b_rx) = recording_session("user_b");

    registry.register("vrm_user_a", a).await;
    registry.register("user_b", b).await;

    let infos = registry.infos().await;
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].identity, "user_b");
    assert_eq!(infos[1].identity, "vrm_user_a");
    assert_eq!(infos[1].transport, "recorder");
    assert!(infos[1].transport_open);
}
