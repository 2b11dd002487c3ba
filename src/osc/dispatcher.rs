use crate::error::{Delivery, DropReason};
use crate::schema;
use crate::session::{ParameterPayload, SessionRegistry};
use rosc::{OscMessage, OscPacket, OscType};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Head rotation: `/HR pitch yaw roll`
pub const HEAD_ROTATION_ADDR: &str = "/HR";

/// Blendshape weight: `/W index value`
pub const BLENDSHAPE_ADDR: &str = "/W";

/// Fixed fields attached to capture payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Model asset locator sent with every head rotation update
    pub vrm_path: String,

    /// Caption attached to the first head rotation update of the process.
    /// Empty disables it.
    pub caption: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            vrm_path: "Assets/Resources/Model/6493143135142452442.vrm".to_string(),
            caption: "こんにちは、私はリアルタイム配信システムのデモンストレーション用キャラクターです。今からしゃべる間に、口の動きが自然に再生されることに注目してください。".to_string(),
        }
    }
}

/// Maps OSC messages onto parameter payloads for the capture identity
///
/// There is one dispatcher per process, so the caption latch is
/// process-wide: it survives reconnects of the capture client.
pub struct OscDispatcher {
    registry: Arc<SessionRegistry>,
    target: String,
    capture: CaptureConfig,
    caption_sent: AtomicBool,
}

impl OscDispatcher {
    pub fn new(registry: Arc<SessionRegistry>, target: impl Into<String>, capture: CaptureConfig) -> Self {
        Self {
            registry,
            target: target.into(),
            capture,
            caption_sent: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn caption_sent(&self) -> bool {
        self.caption_sent.load(Ordering::SeqCst)
    }

    /// Dispatch every message in `packet`, bundles included, in order
    pub async fn dispatch_packet(&self, packet: &OscPacket) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        for message in flatten(packet) {
            deliveries.push(self.dispatch_message(message).await);
        }
        deliveries
    }

    /// Translate one message and send it to the capture session.
    ///
    /// Without a capture session the message is dropped; nothing is queued.
    pub async fn dispatch_message(&self, message: &OscMessage) -> Delivery {
        let Some(session) = self.registry.lookup(&self.target).await else {
            return Delivery::Dropped(DropReason::NoRoute(self.target.clone()));
        };

        match self.translate(message) {
            Ok(payload) => session.send(&payload).await,
            Err(reason) => {
                debug!("Ignoring OSC message {}: {}", message.addr, reason);
                Delivery::Dropped(reason)
            }
        }
    }

    fn translate(&self, message: &OscMessage) -> Result<ParameterPayload, DropReason> {
        match message.addr.as_str() {
            HEAD_ROTATION_ADDR => Ok(self.head_rotation(&message.args)),
            BLENDSHAPE_ADDR => blendshape(&self.target, &message.args),
            other => Err(DropReason::Unmapped(other.to_string())),
        }
    }

    fn head_rotation(&self, args: &[OscType]) -> ParameterPayload {
        // Positional: pitch, yaw, roll. Missing values read as 0.
        let axis = |i: usize| args.get(i).and_then(as_number).unwrap_or(0.0);

        let payload = ParameterPayload::new(&self.target)
            .with_parameter("headPitch", axis(0))
            .with_parameter("headYaw", axis(1))
            .with_parameter("headRoll", axis(2))
            .with_vrm_path(&self.capture.vrm_path);

        if !self.caption_sent.swap(true, Ordering::SeqCst) && !self.capture.caption.is_empty() {
            payload.with_text(&self.capture.caption)
        } else {
            payload
        }
    }
}

fn blendshape(target: &str, args: &[OscType]) -> Result<ParameterPayload, DropReason> {
    let index = args.first().and_then(as_index);
    let value = args.get(1).and_then(as_number);

    match (index, value) {
        (Some(index), Some(value)) => {
            Ok(ParameterPayload::new(target).with_parameter(schema::name_of(index), value))
        }
        _ => Err(DropReason::Malformed(format!(
            "{} expects (index, value), got {:?}",
            BLENDSHAPE_ADDR, args
        ))),
    }
}

fn as_number(arg: &OscType) -> Option<f64> {
    match arg {
        OscType::Float(v) => Some(f64::from(*v)),
        OscType::Double(v) => Some(*v),
        OscType::Int(v) => Some(f64::from(*v)),
        OscType::Long(v) => Some(*v as f64),
        _ => None,
    }
}

fn as_index(arg: &OscType) -> Option<i64> {
    match arg {
        OscType::Int(v) => Some(i64::from(*v)),
        OscType::Long(v) => Some(*v),
        OscType::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        OscType::Double(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

fn flatten(packet: &OscPacket) -> Vec<&OscMessage> {
    match packet {
        OscPacket::Message(message) => vec![message],
        OscPacket::Bundle(bundle) => bundle.content.iter().flat_map(flatten).collect(),
    }
}
