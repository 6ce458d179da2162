//! Worker membership and idle-worker signaling.
//!
//! Every live worker is in the membership map. A worker's id sits in the idle
//! channel exactly while that worker is free, so acquiring a worker is a
//! blocking receive instead of a scan over busy entries. Ids are still checked
//! against membership and state when received, and stale ones are skipped.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_channel::select;
use crossbeam_channel::unbounded;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

use super::Worker;
use super::WorkerId;
use crate::PoolError;

pub struct IdleRegistry {
    workers: Mutex<HashMap<WorkerId, Arc<Worker>>>,
    idle_tx: Sender<WorkerId>,
    idle_rx: Receiver<WorkerId>,
    next_id: AtomicU64,
}

impl IdleRegistry {
    pub fn new() -> Self {
        let (idle_tx, idle_rx) = unbounded();
        Self {
            workers: Mutex::new(HashMap::new()),
            idle_tx,
            idle_rx,
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of live workers
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Number of workers currently announced as idle
    pub fn idle_count(&self) -> usize {
        self.idle_rx.len()
    }

    /// Spawns `count` idle workers. Returns how many were added before the
    /// first spawn failure, if any.
    pub fn grow(
        &self,
        count: usize,
    ) -> Result<usize, PoolError> {
        let mut workers = self.workers.lock();
        for added in 0..count {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let worker = match Worker::spawn(id, self.idle_tx.clone()) {
                Ok(worker) => worker,
                Err(e) if added > 0 => {
                    warn!("grow stopped after {} workers: {}", added, e);
                    return Ok(added);
                }
                Err(e) => return Err(e),
            };
            workers.insert(id, worker);
            let _ = self.idle_tx.send(id);
        }
        Ok(count)
    }

    /// Retires up to `count` idle workers and returns how many were removed.
    ///
    /// Busy workers are never touched: only ids waiting in the idle channel are
    /// candidates, and an entry whose worker turned out to be busy is skipped.
    pub fn shrink(
        &self,
        count: usize,
    ) -> usize {
        let mut retired = Vec::with_capacity(count);
        {
            let mut workers = self.workers.lock();
            let mut budget = self.idle_rx.len();
            while retired.len() < count && budget > 0 {
                budget -= 1;
                let Ok(id) = self.idle_rx.try_recv() else {
                    break;
                };
                match workers.get(&id) {
                    Some(worker) if worker.is_idle() => {
                        if let Some(worker) = workers.remove(&id) {
                            retired.push(worker);
                        }
                    }
                    // busy: it announces itself again when done
                    Some(_) => {}
                    None => {}
                }
            }
        }

        for worker in &retired {
            worker.stop();
        }
        retired.len()
    }

    /// Blocks until a free worker is available or `shutdown` fires.
    pub fn acquire(
        &self,
        shutdown: &Receiver<()>,
    ) -> Option<Arc<Worker>> {
        loop {
            select! {
                recv(self.idle_rx) -> msg => {
                    let id = msg.ok()?;
                    let worker = self.workers.lock().get(&id).cloned();
                    match worker {
                        Some(worker) if worker.is_idle() => return Some(worker),
                        _ => debug!(worker_id = id, "skipping stale idle entry"),
                    }
                }
                recv(shutdown) -> _ => return None,
            }
        }
    }

    /// Stops every worker. Running tasks are allowed to finish first.
    pub fn stop_all(&self) {
        let workers: Vec<Arc<Worker>> = self.workers.lock().drain().map(|(_, w)| w).collect();
        for worker in &workers {
            worker.request_stop();
        }
        for worker in &workers {
            worker.join();
        }
        while self.idle_rx.try_recv().is_ok() {}
    }
}

impl Default for IdleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
