//! Synthetic idle/talking motion for sessions without live capture
//!
//! A plain oscillator: the mouth opens and closes on a sine, the head sways
//! on a slower cosine. Phase always starts at zero; nothing is persisted
//! between runs.

use crate::session::ParameterPayload;

/// Phase advance per tick
pub const PHASE_STEP: f64 = 0.1;

/// Head yaw amplitude in degrees
pub const HEAD_YAW_AMPLITUDE: f64 = 20.0;

/// One oscillator sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Phase the sample was taken at
    pub t: f64,
    /// Normalized 0..1, rounded to 3 decimals
    pub mouth_open: f64,
    /// Degrees, rounded to 2 decimals
    pub head_yaw: f64,
}

impl MotionSample {
    pub fn at(t: f64) -> Self {
        Self {
            t,
            mouth_open: round_to(0.5 * t.sin() + 0.5, 3),
            head_yaw: round_to(HEAD_YAW_AMPLITUDE * (0.5 * t).cos(), 2),
        }
    }

    pub fn to_payload(&self, identity: &str) -> ParameterPayload {
        ParameterPayload::new(identity)
            .with_parameter("mouthOpen", self.mouth_open)
            .with_parameter("headYaw", self.head_yaw)
    }
}

/// Oscillator state: the current phase
#[derive(Debug, Default)]
pub struct SyntheticMotion {
    t: f64,
}

impl SyntheticMotion {
    pub fn new() -> Self {
        Self { t: 0.0 }
    }

    /// Sample the current phase, then advance it
    pub fn next_sample(&mut self) -> MotionSample {
        let sample = MotionSample::at(self.t);
        self.t += PHASE_STEP;
        sample
    }
}

impl Iterator for SyntheticMotion {
    type Item = MotionSample;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_sample())
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
