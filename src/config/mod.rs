//! Configuration management for the query server.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`DDB__` prefix)
//! - Component-wise validation
//!
//! Configuration is immutable once the server is built from it.
mod catalog;
mod heartbeat;
mod listener;
mod monitoring;
mod pool;
pub use catalog::*;
pub use heartbeat::*;
pub use listener::*;
pub use monitoring::*;
pub use pool::*;

#[cfg(test)]
mod pool_test;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable prefix, e.g. `DDB__POOL__MAX_WORKERS=64`
pub const ENV_PREFIX: &str = "DDB";

/// Root configuration container
///
/// Sources are merged in order (later overrides earlier):
/// 1. Default values from code
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServerConfig {
    /// Listening socket parameters
    #[serde(default)]
    pub listener: ListenerConfig,
    /// Worker pool bounds and resize policy
    #[serde(default)]
    pub pool: PoolConfig,
    /// Liveness sweep parameters
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    /// Metrics exporter
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Records served by the bundled in-memory executor
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl ServerConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Validation is deferred so callers can layer more overrides with
    /// [`with_override_config`](Self::with_override_config). Call
    /// [`validate`](Self::validate) before using the result.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("DDB__LISTENER__PORT", "9100");
    /// let cfg = ServerConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from a file without validation.
    ///
    /// Environment variables are re-applied on top so they keep the highest priority.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.listener.validate()?;
        self.pool.validate()?;
        self.heartbeat.validate()?;
        self.monitoring.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
