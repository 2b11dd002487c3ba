use std::path::PathBuf;
use thiserror::Error;

/// Speech-to-lipsync errors
#[derive(Error, Debug)]
pub enum LipsyncError {
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio decode failed: {0:#}")]
    Decode(anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid audio filename: {0:?}")]
    InvalidFilename(String),
}

impl LipsyncError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| LipsyncError::Io { path, source }
    }
}
