pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod lipsync;
pub mod motion;
pub mod osc;
pub mod schema;
pub mod server;
pub mod session;
pub mod ws;

pub use audio::AudioFile;
pub use config::Config;
pub use error::{Delivery, DropReason, RelayError};
pub use http::{create_router, AppState};
pub use lipsync::{LipsyncArtifacts, LipsyncBridge, LipsyncError, LipsyncTrack, SpeechSynthesizer};
pub use osc::{OscDispatcher, OscReceiver};
pub use server::RelayHandle;
pub use session::{IdentityPolicy, ParameterPayload, Session, SessionRegistry, SessionState};
pub use ws::{create_ws_router, ConnectionHub, RelayState};
