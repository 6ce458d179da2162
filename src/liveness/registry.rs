use std::io;
use std::net::Shutdown;
use std::net::TcpStream;

use dashmap::DashMap;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use super::ConnectionId;
use crate::metrics;

/// Something the sweeper can force closed from another thread.
///
/// Closing must unblock a reader blocked on the same socket.
#[cfg_attr(test, automock)]
pub trait ForceClose: Send + Sync + 'static {
    fn force_close(&self) -> io::Result<()>;
}

impl ForceClose for TcpStream {
    fn force_close(&self) -> io::Result<()> {
        // shutdown acts on the socket, so a read blocked on any clone returns 0
        self.shutdown(Shutdown::Both)
    }
}

struct LivenessEntry {
    misses: u32,
    closer: Box<dyn ForceClose>,
}

/// Shared map from connection identity to miss-counter.
///
/// Insert (acceptor), reset (sessions) and sweep/evict (sweeper) all go
/// through the same sharded lock of the underlying `DashMap`.
pub struct LivenessRegistry {
    entries: DashMap<ConnectionId, LivenessEntry>,
    miss_threshold: u32,
}

impl LivenessRegistry {
    pub fn new(miss_threshold: u32) -> Self {
        Self {
            entries: DashMap::new(),
            miss_threshold,
        }
    }

    pub fn miss_threshold(&self) -> u32 {
        self.miss_threshold
    }

    /// Starts tracking `id` with a zero counter. Registering a tracked id
    /// only refreshes its counter.
    pub fn register(
        &self,
        id: ConnectionId,
        closer: Box<dyn ForceClose>,
    ) {
        self.entries
            .entry(id)
            .and_modify(|entry| entry.misses = 0)
            .or_insert(LivenessEntry { misses: 0, closer });
        metrics::LIVE_CONNECTIONS.set(self.entries.len() as i64);
    }

    /// Resets the counter of `id`. Returns `false` when `id` is not tracked.
    pub fn reset(
        &self,
        id: ConnectionId,
    ) -> bool {
        match self.entries.get_mut(&id) {
            Some(mut entry) => {
                entry.misses = 0;
                true
            }
            None => false,
        }
    }

    /// Stops tracking `id` without closing it.
    pub fn remove(
        &self,
        id: ConnectionId,
    ) -> bool {
        let removed = self.entries.remove(&id).is_some();
        metrics::LIVE_CONNECTIONS.set(self.entries.len() as i64);
        removed
    }

    pub fn misses(
        &self,
        id: ConnectionId,
    ) -> Option<u32> {
        self.entries.get(&id).map(|entry| entry.misses)
    }

    pub fn contains(
        &self,
        id: ConnectionId,
    ) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One sweep tick.
    ///
    /// Entries that already reached the threshold are force-closed and
    /// evicted, every other entry gets its counter bumped. Returns the
    /// evicted ids.
    pub fn sweep(&self) -> Vec<ConnectionId> {
        let mut evicted = Vec::new();
        self.entries.retain(|id, entry| {
            if entry.misses >= self.miss_threshold {
                if let Err(e) = entry.closer.force_close() {
                    debug!(conn_id = %id, "force close failed: {}", e);
                }
                evicted.push(*id);
                false
            } else {
                entry.misses += 1;
                true
            }
        });

        if !evicted.is_empty() {
            metrics::LIVENESS_EVICTIONS.inc_by(evicted.len() as u64);
        }
        metrics::LIVE_CONNECTIONS.set(self.entries.len() as i64);
        evicted
    }

    /// Force-closes and evicts every tracked connection. Returns how many.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        self.entries.retain(|id, entry| {
            if let Err(e) = entry.closer.force_close() {
                debug!(conn_id = %id, "force close failed: {}", e);
            }
            closed += 1;
            false
        });
        metrics::LIVE_CONNECTIONS.set(0);
        closed
    }
}
