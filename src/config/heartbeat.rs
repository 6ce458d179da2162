use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Liveness sweep parameters
///
/// A connection that stays silent for roughly
/// `miss_threshold * sweep_interval_in_ms` is force-closed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HeartbeatConfig {
    /// Period of the sweep (milliseconds)
    #[serde(default = "default_sweep_interval_in_ms")]
    pub sweep_interval_in_ms: u64,

    /// Missed sweeps tolerated before eviction
    #[serde(default = "default_miss_threshold")]
    pub miss_threshold: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            sweep_interval_in_ms: default_sweep_interval_in_ms(),
            miss_threshold: default_miss_threshold(),
        }
    }
}

impl HeartbeatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_in_ms == 0 {
            return Err(Error::InvalidConfig("heartbeat.sweep_interval_in_ms must be positive".into()));
        }
        if self.miss_threshold == 0 {
            return Err(Error::InvalidConfig("heartbeat.miss_threshold must be at least 1".into()));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_in_ms)
    }

    /// Silence tolerated before a connection is closed
    pub fn silence_tolerance(&self) -> Duration {
        self.sweep_interval() * self.miss_threshold
    }
}

fn default_sweep_interval_in_ms() -> u64 {
    5000
}
fn default_miss_threshold() -> u32 {
    4
}
