use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::MAX_REQUEST_SIZE;
use crate::Error;
use crate::Result;

/// Listening socket parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ListenerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port, 0 picks an ephemeral port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Accept backlog passed to `listen(2)`
    #[serde(default = "default_backlog")]
    pub backlog: i32,

    /// Upper bound of a single socket read in bytes
    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog: default_backlog(),
            recv_buffer_size: default_recv_buffer_size(),
        }
    }
}

impl ListenerConfig {
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.backlog <= 0 {
            return Err(Error::InvalidConfig(format!(
                "listener.backlog must be positive, got {}",
                self.backlog
            )));
        }

        if self.recv_buffer_size == 0 || self.recv_buffer_size > MAX_REQUEST_SIZE {
            return Err(Error::InvalidConfig(format!(
                "listener.recv_buffer_size must be within 1..={}, got {}",
                MAX_REQUEST_SIZE, self.recv_buffer_size
            )));
        }

        Ok(())
    }

    /// Resolves `host:port` into a bindable address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("invalid listen address {}:{}: {}", self.host, self.port, e)))
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9000
}
fn default_backlog() -> i32 {
    100
}
fn default_recv_buffer_size() -> usize {
    MAX_REQUEST_SIZE
}
