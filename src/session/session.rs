use super::egress::Egress;
use super::payload::ParameterPayload;
use super::stats::{SessionInfo, SessionState};
use crate::error::{Delivery, DropReason, RelayError};
use crate::motion::SyntheticMotion;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One logical animation target
///
/// A session wraps the transport it sends through and, optionally, a
/// synthetic motion generator that feeds the same transport.
pub struct Session {
    /// Routing identity
    identity: String,

    /// Where payloads go
    egress: Arc<dyn Egress>,

    /// When the session was created
    connected_at: chrono::DateTime<chrono::Utc>,

    /// Lifecycle state and the running generator, if any
    lifecycle: Mutex<Lifecycle>,

    /// Payloads accepted by the transport
    payloads_sent: Arc<AtomicUsize>,
}

struct Lifecycle {
    state: SessionState,
    generator: Option<Generator>,
}

/// A running synthetic loop
///
/// `active` gates every tick's delivery. Cancelling flips it under the lock,
/// so once `cancel` returns no tick can reach the transport.
struct Generator {
    active: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl Generator {
    async fn cancel(self) {
        *self.active.lock().await = false;
        self.task.abort();
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Session {
    pub fn new(identity: impl Into<String>, egress: Arc<dyn Egress>) -> Self {
        let identity = identity.into();
        debug!("Creating session {} on {}", identity, egress.name());

        Self {
            identity,
            egress,
            connected_at: Utc::now(),
            lifecycle: Mutex::new(Lifecycle {
                state: SessionState::Created,
                generator: None,
            }),
            payloads_sent: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Send a payload, best-effort.
    ///
    /// A closed transport drops the payload silently; the returned
    /// `Delivery` only says what happened.
    pub async fn send(&self, payload: &ParameterPayload) -> Delivery {
        let text = match payload.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize payload for {}: {}", self.identity, e);
                return Delivery::Dropped(DropReason::Malformed(e.to_string()));
            }
        };

        deliver(&*self.egress, &self.identity, text, &self.payloads_sent).await
    }

    /// Start the synthetic motion loop.
    ///
    /// Every start begins at phase zero. Starting while already generating
    /// is a no-op.
    pub async fn start_synthetic_loop(&self, period: Duration) -> Result<(), RelayError> {
        let mut lifecycle = self.lifecycle.lock().await;

        match lifecycle.state {
            SessionState::Stopped => return Err(RelayError::SessionClosed(self.identity.clone())),
            SessionState::Generating => {
                warn!("Synthetic loop already running for {}", self.identity);
                return Ok(());
            }
            SessionState::Created | SessionState::Idle => {}
        }

        let active = Arc::new(Mutex::new(true));
        let task = tokio::spawn(run_synthetic_loop(
            self.identity.clone(),
            Arc::clone(&self.egress),
            period,
            Arc::clone(&active),
            Arc::clone(&self.payloads_sent),
        ));

        lifecycle.generator = Some(Generator { active, task });
        lifecycle.state = SessionState::Generating;

        info!(
            "Synthetic loop started for {} (every {}ms)",
            self.identity,
            period.as_millis()
        );

        Ok(())
    }

    /// Stop the synthetic loop if it is running. Safe to call at any time.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;

        if let Some(generator) = lifecycle.generator.take() {
            generator.cancel().await;
            lifecycle.state = SessionState::Idle;
            info!("Synthetic loop stopped for {}", self.identity);
        }
    }

    /// Stop generating and move to the terminal state
    pub async fn close(&self) {
        let mut lifecycle = self.lifecycle.lock().await;

        if let Some(generator) = lifecycle.generator.take() {
            generator.cancel().await;
        }

        if lifecycle.state != SessionState::Stopped {
            lifecycle.state = SessionState::Stopped;
            debug!("Session {} closed", self.identity);
        }
    }

    pub async fn state(&self) -> SessionState {
        self.lifecycle.lock().await.state
    }

    pub async fn info(&self) -> SessionInfo {
        SessionInfo {
            identity: self.identity.clone(),
            state: self.state().await,
            transport: self.egress.name().to_string(),
            transport_open: self.egress.is_open(),
            connected_at: self.connected_at,
            payloads_sent: self.payloads_sent.load(Ordering::SeqCst),
        }
    }
}

async fn deliver(egress: &dyn Egress, identity: &str, text: String, sent: &AtomicUsize) -> Delivery {
    if egress.transmit(text).await {
        sent.fetch_add(1, Ordering::SeqCst);
        Delivery::Sent
    } else {
        debug!("Dropped payload for {}: transport closed", identity);
        Delivery::Dropped(DropReason::TransportClosed(identity.to_string()))
    }
}

async fn run_synthetic_loop(
    identity: String,
    egress: Arc<dyn Egress>,
    period: Duration,
    active: Arc<Mutex<bool>>,
    sent: Arc<AtomicUsize>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut motion = SyntheticMotion::new();

    loop {
        ticker.tick().await;

        let payload = motion.next_sample().to_payload(&identity);
        let text = match payload.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize synthetic payload: {}", e);
                continue;
            }
        };

        let active = active.lock().await;
        if !*active {
            break;
        }
        deliver(&*egress, &identity, text, &sent).await;
    }

    debug!("Synthetic loop for {} exited", identity);
}
