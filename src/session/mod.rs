//! Session routing
//!
//! This module provides the pieces that decide where a parameter update goes:
//! - `Session`: one animation target with its transport and optional motion generator
//! - `SessionRegistry`: identity → session table shared by all adapters
//! - `IdentityPolicy`: connection-order identity assignment
//! - `ParameterPayload`: the JSON update sent to rendering clients

mod config;
mod egress;
mod identity;
mod payload;
mod registry;
mod session;
mod stats;

pub use config::SimulatorConfig;
pub use egress::Egress;
pub use identity::{IdentityPolicy, CAPTURE_IDENTITY, SIMULATED_IDENTITY};
pub use payload::ParameterPayload;
pub use registry::SessionRegistry;
pub use session::Session;
pub use stats::{SessionInfo, SessionState};
