//! Speech-to-lipsync bridge
//!
//! Text goes to a TTS engine; the returned WAV is stored under the audio
//! directory together with a JSON envelope of per-frame mouth openness that
//! clients play back in sync with the audio.

mod bridge;
mod envelope;
mod error;
mod synthesizer;

pub use bridge::{unique_filename, LipsyncArtifacts, LipsyncBridge, LipsyncConfig, DEFAULT_PROMPT};
pub use envelope::{compute_envelope, LipsyncTrack, DEFAULT_FRAME_SIZE, ENVELOPE_GAIN};
pub use error::LipsyncError;
pub use synthesizer::{GoogleTtsEngine, SpeechSynthesizer, TtsConfig, API_KEY_ENV};
