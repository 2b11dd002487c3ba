use super::envelope::{LipsyncTrack, DEFAULT_FRAME_SIZE};
use super::error::LipsyncError;
use super::synthesizer::SpeechSynthesizer;
use crate::audio::AudioFile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Default prompt spoken when a client signals readiness
pub const DEFAULT_PROMPT: &str = "안녕하세요! 지금 들리시는 목소리는 TTS를 활용해서 재생되고 있습니다.제 입 모양은 음성에 맞춰 자동으로 립싱크되고 있어요.";

/// Storage and publishing settings for synthesized speech
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipsyncConfig {
    /// Directory the WAV and envelope files are written to
    pub audio_dir: PathBuf,

    /// URL prefix under which `audio_dir` is served. Empty means
    /// `http://localhost:<http port>/audio`.
    pub public_base_url: String,

    /// Samples per envelope frame
    pub frame_size: usize,

    /// Text spoken when a ready message carries none
    pub prompt: String,
}

impl Default for LipsyncConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("public/audio"),
            public_base_url: String::new(),
            frame_size: DEFAULT_FRAME_SIZE,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

/// Files produced for one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LipsyncArtifacts {
    pub audio_path: PathBuf,
    pub json_path: PathBuf,
    pub audio_url: String,
    pub json_url: String,
}

/// Turns text into a WAV file plus its mouth-openness envelope
pub struct LipsyncBridge {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    audio_dir: PathBuf,
    public_base_url: String,
    frame_size: usize,
}

impl LipsyncBridge {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, config: &LipsyncConfig) -> Self {
        Self {
            synthesizer,
            audio_dir: config.audio_dir.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            frame_size: config.frame_size,
        }
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Synthesize into a fresh `tts_<id>.wav`, so concurrent requests never
    /// share a file.
    pub async fn synthesize(&self, text: &str) -> Result<LipsyncArtifacts, LipsyncError> {
        self.synthesize_to(text, &unique_filename()).await
    }

    /// Synthesize into `filename` under the storage root, overwriting it
    pub async fn synthesize_to(&self, text: &str, filename: &str) -> Result<LipsyncArtifacts, LipsyncError> {
        validate_filename(filename)?;

        let audio = self.synthesizer.synthesize(text).await?;

        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(LipsyncError::io(&self.audio_dir))?;

        let audio_path = self.audio_dir.join(filename);
        tokio::fs::write(&audio_path, &audio)
            .await
            .map_err(LipsyncError::io(&audio_path))?;

        let json_path = audio_path.with_extension("json");
        let track = analyze(audio_path.clone(), self.frame_size).await?;

        let json = serde_json::to_vec_pretty(&track)?;
        tokio::fs::write(&json_path, json)
            .await
            .map_err(LipsyncError::io(&json_path))?;

        info!(
            "Lipsync track written: {} ({} frames)",
            json_path.display(),
            track.frames.len()
        );

        Ok(LipsyncArtifacts {
            audio_url: self.url_for(&audio_path),
            json_url: self.url_for(&json_path),
            audio_path,
            json_path,
        })
    }

    fn url_for(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        format!("{}/{}", self.public_base_url, name)
    }
}

/// Decode the stored WAV on the blocking pool and build its envelope
async fn analyze(path: PathBuf, frame_size: usize) -> Result<LipsyncTrack, LipsyncError> {
    tokio::task::spawn_blocking(move || -> Result<LipsyncTrack, LipsyncError> {
        let audio = AudioFile::open(&path).map_err(LipsyncError::Decode)?;
        Ok(LipsyncTrack::from_audio(&audio, frame_size))
    })
    .await
    .map_err(|e| LipsyncError::Decode(anyhow::anyhow!("Analysis task failed: {}", e)))?
}

/// `tts_<8 hex chars>.wav`
pub fn unique_filename() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("tts_{}.wav", &id[..8])
}

fn validate_filename(filename: &str) -> Result<(), LipsyncError> {
    let plain = Path::new(filename)
        .file_name()
        .is_some_and(|name| name == filename);

    if filename.is_empty() || !plain {
        return Err(LipsyncError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}
