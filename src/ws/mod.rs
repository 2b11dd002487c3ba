//! WebSocket transport for rendering clients
//!
//! - Each connection is admitted as a session under an assigned identity
//! - Clients send `{"ready": true}` to request synthesized speech
//! - Parameter payloads flow out as JSON text frames

mod handlers;
mod hub;
mod messages;
mod routes;
mod state;

pub use handlers::{speak, SPEECH_MOUTH_OPEN};
pub use hub::{BroadcastEgress, ConnectionEgress, ConnectionHub, ConnectionId};
pub use messages::{ClientMessage, SpeakRequest};
pub use routes::create_ws_router;
pub use state::RelayState;
