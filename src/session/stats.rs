use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session lifecycle
///
/// `Created → Generating ⇄ Idle → Stopped`. `Stopped` is terminal; resuming
/// means registering a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Generating,
    Idle,
    Stopped,
}

/// Snapshot of a session for status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Routing identity
    pub identity: String,

    /// Current lifecycle state
    pub state: SessionState,

    /// Transport name (connection id or "broadcast")
    pub transport: String,

    /// Whether the transport still accepts payloads
    pub transport_open: bool,

    /// When the session was created
    pub connected_at: DateTime<Utc>,

    /// Number of payloads handed to the transport
    pub payloads_sent: usize,
}
