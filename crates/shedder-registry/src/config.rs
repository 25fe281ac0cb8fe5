//! Registry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shedder_engine::EngineConfig;

/// Tuning for the registry and the runner tasks it spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Capacity of each session's action queue.
    pub channel_capacity: usize,

    /// How long `submit` / `send_action` wait for room in a full queue
    /// before giving up with `ActionTimeout`.
    pub submit_timeout: Duration,

    /// How often a runner checks for inactivity.
    pub idle_tick: Duration,

    /// Cancel a running session after this long without an applied
    /// action. `None` disables the check.
    pub idle_timeout: Option<Duration>,

    /// Rules used by `create_session`.
    pub engine: EngineConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            submit_timeout: Duration::from_secs(5),
            idle_tick: Duration::from_secs(1),
            idle_timeout: Some(Duration::from_secs(600)),
            engine: EngineConfig::default(),
        }
    }
}
