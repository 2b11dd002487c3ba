use crate::session::Egress;
use async_trait::async_trait;
use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

pub type ConnectionId = u64;

/// Outbound channels of every open WebSocket connection
///
/// Each connection owns a writer task draining an unbounded channel, so
/// payloads queued through one channel reach the socket in order.
pub struct ConnectionHub {
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Track a connection's outbound channel and return its id
    pub async fn attach(&self, tx: mpsc::UnboundedSender<Message>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.connections.write().await.insert(id, tx);
        id
    }

    pub async fn detach(&self, id: ConnectionId) {
        self.connections.write().await.remove(&id);
    }

    /// Send `text` to every open connection, skipping closed ones.
    /// Returns how many connections accepted it.
    pub async fn broadcast(&self, text: &str) -> usize {
        let connections = self.connections.read().await;

        let mut delivered = 0;
        for tx in connections.values() {
            if tx.is_closed() {
                continue;
            }
            if tx.send(Message::Text(text.to_string())).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Ask every connection to close and forget them
    pub async fn close_all(&self) -> usize {
        let drained: Vec<_> = {
            let mut connections = self.connections.write().await;
            connections.drain().collect()
        };

        for (id, tx) in &drained {
            if tx.send(Message::Close(None)).is_err() {
                debug!("Connection {} already closed", id);
            }
        }

        info!("Closing {} WebSocket connection(s)", drained.len());
        drained.len()
    }

    pub async fn len(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Egress bound to a single WebSocket connection
pub struct ConnectionEgress {
    name: String,
    tx: mpsc::UnboundedSender<Message>,
}

impl ConnectionEgress {
    pub fn new(id: ConnectionId, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            name: format!("ws-{}", id),
            tx,
        }
    }
}

#[async_trait]
impl Egress for ConnectionEgress {
    async fn transmit(&self, text: String) -> bool {
        self.tx.send(Message::Text(text)).is_ok()
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Egress that fans out to every open connection
///
/// Used by the standalone simulator, which exists before any client does.
pub struct BroadcastEgress {
    hub: Arc<ConnectionHub>,
}

impl BroadcastEgress {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl Egress for BroadcastEgress {
    async fn transmit(&self, text: String) -> bool {
        self.hub.broadcast(&text).await > 0
    }

    fn is_open(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "broadcast"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_skips_closed_connections() {
        let hub = ConnectionHub::new();

        let (open_tx, mut open_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        hub.attach(open_tx).await;
        hub.attach(closed_tx).await;
        drop(closed_rx);

        assert_eq!(hub.broadcast("hello").await, 1);
        assert_eq!(hub.len().await, 1);
        assert!(matches!(open_rx.recv().await, Some(Message::Text(t)) if t == "hello"));
    }

    #[tokio::test]
    async fn test_broadcast_with_no_connections() {
        let hub = Arc::new(ConnectionHub::new());
        let egress = BroadcastEgress::new(Arc::clone(&hub));

        assert!(!egress.transmit("{}".to_string()).await);
        assert!(hub.is_empty().await);
    }

    #[tokio::test]
    async fn test_close_all_sends_close_frame() {
        let hub = ConnectionHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.attach(tx).await;
        assert_eq!(id, 1);

        assert_eq!(hub.close_all().await, 1);
        assert!(matches!(rx.recv().await, Some(Message::Close(None))));
        assert!(hub.is_empty().await);
    }

    #[tokio::test]
    async fn test_connection_egress_reports_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let egress = ConnectionEgress::new(7, tx);
        assert_eq!(egress.name(), "ws-7");
        assert!(egress.is_open());

        drop(rx);
        assert!(!egress.is_open());
        assert!(!egress.transmit("{}".to_string()).await);
    }
}
