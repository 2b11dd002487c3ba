// Integration tests for FaceCap OSC ingress

use async_trait::async_trait;
use rosc::{OscBundle, OscMessage, OscPacket, OscTime, OscType};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use vrm_relay::error::{Delivery, DropReason};
use vrm_relay::osc::{CaptureConfig, OscDispatcher, OscReceiver};
use vrm_relay::session::{Egress, Session, SessionRegistry};

const TARGET: &str = "vrm_user_a";

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

fn message(addr: &str, args: Vec<OscType>) -> OscMessage {
    OscMessage {
        addr: addr.to_string(),
        args,
    }
}

fn head_rotation(pitch: f32, yaw: f32, roll: f32) -> OscMessage {
    message(
        "/HR",
        vec![OscType::Float(pitch), OscType::Float(yaw), OscType::Float(roll)],
    )
}

async fn attach_capture(registry: &SessionRegistry) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Arc::new(Session::new(TARGET, Arc::new(Recorder { tx })));
    registry.register(TARGET, session).await;
    rx
}

fn dispatcher(registry: &Arc<SessionRegistry>) -> OscDispatcher {
    OscDispatcher::new(Arc::clone(registry), TARGET, CaptureConfig::default())
}

fn next_payload(rx: &mut mpsc::UnboundedReceiver<String>) -> Value {
    serde_json::from_str(&rx.try_recv().expect("payload")).unwrap()
}

#[tokio::test]
async fn test_no_capture_session_drops_without_latching_caption() {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = dispatcher(&registry);

    let delivery = dispatcher.dispatch_message(&head_rotation(1.0, 2.0, 3.0)).await;

    assert_eq!(delivery, Delivery::Dropped(DropReason::NoRoute(TARGET.to_string())));
    assert!(!dispatcher.caption_sent());
}

#[tokio::test]
async fn test_head_rotation_payload() {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = dispatcher(&registry);
    let mut rx = attach_capture(&registry).await;

    assert!(dispatcher
        .dispatch_message(&head_rotation(1.5, -2.0, 0.25))
        .await
        .is_sent());

    let payload = next_payload(&mut rx);
    assert_eq!(payload["userId"], TARGET);
    assert_eq!(payload["parameters"]["headPitch"], 1.5);
    assert_eq!(payload["parameters"]["headYaw"], -2.0);
    assert_eq!(payload["parameters"]["headRoll"], 0.25);
    assert_eq!(payload["vrmPath"], CaptureConfig::default().vrm_path);
}

#[tokio::test]
async fn test_missing_axes_default_to_zero() {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = dispatcher(&registry);
    let mut rx = attach_capture(&registry).await;

    dispatcher
        .dispatch_message(&message("/HR", vec![OscType::Float(4.0)]))
        .await;

    let payload = next_payload(&mut rx);
    assert_eq!(payload["parameters"]["headPitch"], 4.0);
    assert_eq!(payload["parameters"]["headYaw"], 0.0);
    assert_eq!(payload["parameters"]["headRoll"], 0.0);
}

#[tokio::test]
async fn test_caption_is_sent_once_per_process() {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = dispatcher(&registry);
    let mut rx = attach_capture(&registry).await;

    dispatcher.dispatch_message(&head_rotation(0.0, 0.0, 0.0)).await;
    dispatcher.dispatch_message(&head_rotation(0.0, 0.0, 0.0)).await;

    let first = next_payload(&mut rx);
    let second = next_payload(&mut rx);
    assert_eq!(first["text"], CaptureConfig::default().caption);
    assert!(second.get("text").is_none());
    assert!(dispatcher.caption_sent());

    // A reconnecting capture client does not get the caption again
    let mut rx = attach_capture(&registry).await;
    dispatcher.dispatch_message(&head_rotation(0.0, 0.0, 0.0)).await;
    assert!(next_payload(&mut rx).get("text").is_none());
}

#[tokio::test]
async fn test_blendshape_known_and_fallback_names() {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = dispatcher(&registry);
    let mut rx = attach_capture(&registry).await;

    dispatcher
        .dispatch_message(&message("/W", vec![OscType::Int(24), OscType::Float(0.75)]))
        .await;
    dispatcher
        .dispatch_message(&message("/W", vec![OscType::Int(999), OscType::Float(0.5)]))
        .await;

    let known = next_payload(&mut rx);
    assert_eq!(known["parameters"]["mouthOpen"], 0.75);
    assert!(known.get("vrmPath").is_none());

    let fallback = next_payload(&mut rx);
    assert_eq!(fallback["parameters"]["Blendshape_999"], 0.5);
}

#[tokio::test]
async fn test_unknown_and_malformed_messages_are_ignored() {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = dispatcher(&registry);
    let mut rx = attach_capture(&registry).await;

    let unknown = dispatcher
        .dispatch_message(&message("/foo", vec![OscType::Float(1.0)]))
        .await;
    assert_eq!(unknown, Delivery::Dropped(DropReason::Unmapped("/foo".to_string())));

    let short = dispatcher
        .dispatch_message(&message("/W", vec![OscType::Int(3)]))
        .await;
    assert!(matches!(short, Delivery::Dropped(DropReason::Malformed(_))));

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_bundle_messages_are_dispatched_in_order() {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = dispatcher(&registry);
    let mut rx = attach_capture(&registry).await;

    let bundle = OscPacket::Bundle(OscBundle {
        timetag: OscTime {
            seconds: 0,
            fractional: 1,
        },
        content: vec![
            OscPacket::Message(message("/W", vec![OscType::Int(13), OscType::Float(1.0)])),
            OscPacket::Message(message("/W", vec![OscType::Int(14), OscType::Float(0.0)])),
        ],
    });

    let deliveries = dispatcher.dispatch_packet(&bundle).await;
    assert_eq!(deliveries, vec![Delivery::Sent, Delivery::Sent]);

    assert_eq!(next_payload(&mut rx)["parameters"]["eyeBlink_L"], 1.0);
    assert_eq!(next_payload(&mut rx)["parameters"]["eyeBlink_R"], 0.0);
}

#[tokio::test]
async fn test_udp_datagram_reaches_capture_session() {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = Arc::new(dispatcher(&registry));
    let mut rx = attach_capture(&registry).await;

    let receiver = OscReceiver::bind("127.0.0.1:0".parse().unwrap(), dispatcher)
        .await
        .unwrap();
    let addr = receiver.local_addr().unwrap();
    let task = tokio::spawn(receiver.run());

    let packet = OscPacket::Message(message("/W", vec![OscType::Int(24), OscType::Float(0.4)]));
    let bytes = rosc::encoder::encode(&packet).unwrap();

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(b"not osc", addr).await.unwrap();
    client.send_to(&bytes, addr).await.unwrap();

    let text = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for payload")
        .unwrap();
    let payload: Value = serde_json::from_str(&text).unwrap();
    assert!((payload["parameters"]["mouthOpen"].as_f64().unwrap() - 0.4).abs() < 1e-6);

    task.abort();
}
