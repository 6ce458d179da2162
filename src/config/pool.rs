use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Worker pool bounds and elastic resize policy
///
/// The pool keeps `min_workers <= workers <= max_workers` at all times. Since a
/// worker serves one connection for that connection's whole lifetime,
/// `max_workers` is also the ceiling on concurrently served connections.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolConfig {
    /// Upper bound on live workers
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Lower bound on live workers
    #[serde(default = "default_min_workers")]
    pub min_workers: usize,

    /// Workers spawned when the pool starts
    #[serde(default = "default_initial_workers")]
    pub initial_workers: usize,

    /// Workers added or retired per resize tick
    #[serde(default = "default_step")]
    pub step: usize,

    /// Period of the size controller (milliseconds)
    #[serde(default = "default_resize_interval_in_ms")]
    pub resize_interval_in_ms: u64,

    /// Grow when `pending > growth_factor * idle`
    #[serde(default = "default_growth_factor")]
    pub growth_factor: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            min_workers: default_min_workers(),
            initial_workers: default_initial_workers(),
            step: default_step(),
            resize_interval_in_ms: default_resize_interval_in_ms(),
            growth_factor: default_growth_factor(),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::InvalidConfig("pool.max_workers must be at least 1".into()));
        }

        if self.max_workers < self.min_workers {
            return Err(Error::InvalidConfig(format!(
                "pool.max_workers ({}) < pool.min_workers ({})",
                self.max_workers, self.min_workers
            )));
        }

        if self.initial_workers < self.min_workers || self.initial_workers > self.max_workers {
            return Err(Error::InvalidConfig(format!(
                "pool.initial_workers ({}) must be within [{}, {}]",
                self.initial_workers, self.min_workers, self.max_workers
            )));
        }

        if self.step == 0 {
            return Err(Error::InvalidConfig("pool.step must be at least 1".into()));
        }

        if self.resize_interval_in_ms == 0 {
            return Err(Error::InvalidConfig("pool.resize_interval_in_ms must be positive".into()));
        }

        if self.growth_factor == 0 {
            return Err(Error::InvalidConfig("pool.growth_factor must be at least 1".into()));
        }

        Ok(())
    }

    pub fn resize_interval(&self) -> Duration {
        Duration::from_millis(self.resize_interval_in_ms)
    }
}

fn default_max_workers() -> usize {
    300
}
fn default_min_workers() -> usize {
    5
}
fn default_initial_workers() -> usize {
    50
}
fn default_step() -> usize {
    5
}
fn default_resize_interval_in_ms() -> u64 {
    3000
}
fn default_growth_factor() -> usize {
    10
}
