use crate::session::SessionRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active sessions (identity → session)
    pub registry: Arc<SessionRegistry>,

    /// Directory served under `/audio`
    pub audio_dir: PathBuf,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            audio_dir: audio_dir.into(),
        }
    }
}
