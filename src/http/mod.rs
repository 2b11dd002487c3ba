//! HTTP service for artifacts and status
//!
//! - GET /audio/{file} - Synthesized WAV files and lipsync envelopes
//! - GET /sessions - List active sessions
//! - GET /sessions/:identity - Query one session
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
