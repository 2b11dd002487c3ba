use super::hub::ConnectionHub;
use crate::lipsync::LipsyncBridge;
use crate::session::{IdentityPolicy, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Shared state for WebSocket handlers
#[derive(Clone)]
pub struct RelayState {
    /// Active sessions (identity → session)
    pub registry: Arc<SessionRegistry>,

    /// Outbound channels of open connections
    pub hub: Arc<ConnectionHub>,

    /// Identity assignment for new connections
    pub policy: Arc<IdentityPolicy>,

    /// Speech synthesis for ready signals
    pub bridge: Arc<LipsyncBridge>,

    /// Tick period for simulated sessions
    pub simulator_period: Duration,

    /// Spoken when a ready message carries no text
    pub default_prompt: Arc<str>,
}
