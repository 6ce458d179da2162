use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::bounded;
use crossbeam_channel::select;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::LivenessRegistry;
use crate::Error;
use crate::HeartbeatConfig;
use crate::Result;

const SWEEPER_THREAD: &str = "ddb-heartbeat";

/// Periodic loop evicting silent connections from a [`LivenessRegistry`].
///
/// Forced closes are the only cancellation path for a session: the blocked
/// read on the evicted socket returns and the session ends as if the peer had
/// disconnected.
pub struct HeartbeatSweeper {
    shutdown_tx: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatSweeper {
    pub fn start(
        registry: Arc<LivenessRegistry>,
        config: &HeartbeatConfig,
    ) -> Result<Self> {
        let interval = config.sweep_interval();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name(SWEEPER_THREAD.to_string())
            .spawn(move || sweep_loop(registry, interval, shutdown_rx))
            .map_err(|source| Error::ThreadSpawn {
                name: SWEEPER_THREAD.to_string(),
                source,
            })?;

        info!(
            "heartbeat sweeper started: interval={:?}, threshold={}",
            interval, config.miss_threshold
        );
        Ok(Self {
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stops the loop and waits for it. Idempotent.
    pub fn stop(&self) {
        drop(self.shutdown_tx.lock().take());
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("heartbeat sweeper panicked");
            }
        }
    }
}

impl Drop for HeartbeatSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sweep_loop(
    registry: Arc<LivenessRegistry>,
    interval: Duration,
    shutdown_rx: Receiver<()>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => break,
            default(interval) => {
                if registry.is_empty() {
                    continue;
                }
                for id in registry.sweep() {
                    info!(conn_id = %id, "connection silent past threshold, closed");
                }
            }
        }
    }
    debug!("heartbeat sweeper exited");
}
