use serde::{Deserialize, Serialize};

/// Identity that receives live FaceCap data over OSC
pub const CAPTURE_IDENTITY: &str = "vrm_user_a";

/// Identity driven by the synthetic motion generator
pub const SIMULATED_IDENTITY: &str = "user_b";

/// Connection-order identity assignment
///
/// Clients do not choose their identity. The first connection claims the
/// capture identity; while it is held, every further connection gets the
/// simulated one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityPolicy {
    pub capture: String,
    pub simulated: String,
}

impl IdentityPolicy {
    /// Pick the identity for a new connection given which identities are taken
    pub fn assign(&self, occupied: impl Fn(&str) -> bool) -> &str {
        if occupied(&self.capture) {
            &self.simulated
        } else {
            &self.capture
        }
    }

    pub fn is_capture(&self, identity: &str) -> bool {
        identity == self.capture
    }

    pub fn is_simulated(&self, identity: &str) -> bool {
        identity == self.simulated
    }
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            capture: CAPTURE_IDENTITY.to_string(),
            simulated: SIMULATED_IDENTITY.to_string(),
        }
    }
}
