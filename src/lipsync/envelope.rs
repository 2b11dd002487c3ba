use crate::audio::AudioFile;
use crate::motion::round_to;
use serde::{Deserialize, Serialize};

/// Samples per envelope frame
pub const DEFAULT_FRAME_SIZE: usize = 512;

/// RMS gain applied before clamping
pub const ENVELOPE_GAIN: f64 = 20.0;

/// Mouth-openness envelope written next to the synthesized audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LipsyncTrack {
    pub sample_rate: u32,
    pub frame_size: usize,
    /// One intensity per frame, each in 0.0..=1.0
    pub frames: Vec<f64>,
}

impl LipsyncTrack {
    /// Envelope of the first channel of `audio`
    pub fn from_audio(audio: &AudioFile, frame_size: usize) -> Self {
        Self {
            sample_rate: audio.sample_rate,
            frame_size,
            frames: compute_envelope(&audio.first_channel(), frame_size),
        }
    }
}

/// Coarse open/close intensity per frame.
///
/// Splits `samples` into non-overlapping frames of `frame_size` (a trailing
/// partial frame is discarded), takes each frame's RMS, scales by
/// `ENVELOPE_GAIN`, clamps to 1.0 and rounds to 3 decimals.
pub fn compute_envelope(samples: &[f32], frame_size: usize) -> Vec<f64> {
    if frame_size == 0 {
        return Vec::new();
    }

    samples
        .chunks_exact(frame_size)
        .map(|frame| {
            let energy: f64 = frame.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
            let rms = (energy / frame_size as f64).sqrt();
            round_to((rms * ENVELOPE_GAIN).min(1.0), 3)
        })
        .collect()
}
