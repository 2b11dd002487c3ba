use super::identity::IdentityPolicy;
use super::payload::ParameterPayload;
use super::session::Session;
use super::stats::SessionInfo;
use crate::error::{Delivery, DropReason};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Process-wide table of sessions (identity → session)
///
/// One live session per identity. Registering an identity that is already
/// present replaces the old entry.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace. Returns the displaced session, if any.
    pub async fn register(&self, identity: impl Into<String>, session: Arc<Session>) -> Option<Arc<Session>> {
        let identity = identity.into();
        let displaced = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(identity.clone(), session)
        };

        if displaced.is_some() {
            info!("Session replaced: {}", identity);
        } else {
            info!("Session registered: {}", identity);
        }

        displaced
    }

    /// Assign an identity with `policy` and register the session built for
    /// it, under a single write lock.
    ///
    /// Returns the new session and whatever it displaced.
    pub async fn admit<F>(&self, policy: &IdentityPolicy, build: F) -> (Arc<Session>, Option<Arc<Session>>)
    where
        F: FnOnce(&str) -> Session,
    {
        let mut sessions = self.sessions.write().await;

        let identity = policy.assign(|id| sessions.contains_key(id)).to_string();
        let session = Arc::new(build(&identity));
        let displaced = sessions.insert(identity.clone(), Arc::clone(&session));

        info!("Session admitted: {}", identity);

        (session, displaced)
    }

    pub async fn lookup(&self, identity: &str) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions.get(identity).cloned()
    }

    pub async fn contains(&self, identity: &str) -> bool {
        self.sessions.read().await.contains_key(identity)
    }

    /// Remove an identity. Removing an absent identity is a no-op.
    pub async fn remove(&self, identity: &str) -> Option<Arc<Session>> {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(identity)
        };

        if removed.is_some() {
            info!("Session removed: {}", identity);
        }

        removed
    }

    /// Remove `identity` only while it still maps to `session`.
    ///
    /// A connection that was replaced must not evict its replacement when it
    /// closes.
    pub async fn release(&self, identity: &str, session: &Arc<Session>) -> bool {
        let mut sessions = self.sessions.write().await;

        match sessions.get(identity) {
            Some(current) if Arc::ptr_eq(current, session) => {
                sessions.remove(identity);
                info!("Session removed: {}", identity);
                true
            }
            Some(_) => {
                debug!("Session {} was replaced, keeping the newer entry", identity);
                false
            }
            None => false,
        }
    }

    /// Deliver a payload to the session registered for `identity`.
    ///
    /// A missing session is a silent drop.
    pub async fn route(&self, identity: &str, payload: &ParameterPayload) -> Delivery {
        match self.lookup(identity).await {
            Some(session) => session.send(payload).await,
            None => {
                debug!("No session for {}, dropping payload", identity);
                Delivery::Dropped(DropReason::NoRoute(identity.to_string()))
            }
        }
    }

    pub async fn identities(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut identities: Vec<String> = sessions.keys().cloned().collect();
        identities.sort();
        identities
    }

    pub async fn infos(&self) -> Vec<SessionInfo> {
        let sessions: Vec<Arc<Session>> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };

        let mut infos = Vec::with_capacity(sessions.len());
        for session in sessions {
            infos.push(session.info().await);
        }
        infos.sort_by(|a, b| a.identity.cmp(&b.identity));
        infos
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Take every session out of the registry
    pub async fn drain(&self) -> Vec<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        sessions.drain().map(|(_, session)| session).collect()
    }
}
