//! OSC ingress for FaceCap
//!
//! FaceCap streams head rotation (`/HR`) and blendshape weights (`/W`) over
//! UDP. Every update is routed to the capture identity; other addresses are
//! ignored.

pub mod dispatcher;
pub mod receiver;

pub use dispatcher::{CaptureConfig, OscDispatcher, BLENDSHAPE_ADDR, HEAD_ROTATION_ADDR};
pub use receiver::OscReceiver;
