//! Application-level heartbeat tracking.
//!
//! Every accepted connection gets a miss-counter in the [`LivenessRegistry`].
//! The session resets it on each inbound payload and the
//! [`HeartbeatSweeper`] bumps it once per tick, force-closing connections
//! that reach the threshold.
mod registry;
mod sweeper;

pub use registry::*;
pub use sweeper::*;


use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an accepted connection.
///
/// Unlike a raw file descriptor it is never reused, so a stale registry
/// entry can never alias a newer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
