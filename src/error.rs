use std::net::SocketAddr;
use thiserror::Error;

/// Errors surfaced by the relay core
#[derive(Debug, Error)]
pub enum RelayError {
    /// The session reached its terminal state and cannot generate motion again
    #[error("session {0} is closed")]
    SessionClosed(String),

    #[error("failed to bind {what} listener on {addr}: {source}")]
    Bind {
        what: &'static str,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Why a payload was not delivered.
///
/// These are not failures: parameter streams are best-effort, so every
/// variant is a silent no-op for the caller. They exist so the drop is
/// observable in logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    /// No session is registered for the identity
    #[error("no session registered for {0}")]
    NoRoute(String),

    /// The session's transport is closed or was never attached
    #[error("transport for {0} is closed")]
    TransportClosed(String),

    /// Inbound message has an address with no mapping
    #[error("no mapping for address {0}")]
    Unmapped(String),

    /// Inbound message did not have the expected shape
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Outcome of handing a payload to the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Dropped(DropReason),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent)
    }
}
