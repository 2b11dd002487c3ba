use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for synthetic motion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Start a broadcast simulator session at process start, before any
    /// client connects
    pub standalone: bool,

    /// Tick period in milliseconds
    /// Default: 100
    pub period_ms: u64,
}

impl SimulatorConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.max(1))
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            standalone: true,
            period_ms: 100,
        }
    }
}
