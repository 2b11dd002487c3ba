use super::dispatcher::OscDispatcher;
use crate::error::RelayError;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{error, info, warn};

/// Largest datagram we accept
const MAX_DATAGRAM: usize = 65_536;

/// UDP listener feeding decoded OSC packets to a dispatcher
pub struct OscReceiver {
    socket: UdpSocket,
    dispatcher: Arc<OscDispatcher>,
}

impl OscReceiver {
    pub async fn bind(addr: SocketAddr, dispatcher: Arc<OscDispatcher>) -> Result<Self, RelayError> {
        let socket = UdpSocket::bind(addr).await.map_err(|source| RelayError::Bind {
            what: "OSC",
            addr,
            source,
        })?;

        info!("Listening for OSC on udp://{}", addr);

        Ok(Self { socket, dispatcher })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive until the socket fails. There is no reconnect; a failed
    /// socket stays down until the process restarts.
    pub async fn run(self) {
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) if is_transient(&e) => {
                    warn!("OSC receive error: {}", e);
                    continue;
                }
                Err(e) => {
                    error!("OSC socket failed, no longer receiving: {}", e);
                    return;
                }
            };

            match rosc::decoder::decode_udp(&buf[..len]) {
                Ok((_, packet)) => {
                    self.dispatcher.dispatch_packet(&packet).await;
                }
                Err(e) => {
                    warn!("Failed to decode OSC packet from {}: {:?}", from, e);
                }
            }
        }
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused | ErrorKind::Interrupted | ErrorKind::WouldBlock
    )
}
