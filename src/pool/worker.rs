//! Pool-owned execution thread.
//!
//! A worker holds at most one [`Task`] at any instant. `assign` hands the task
//! back when the slot is taken so the caller can schedule it elsewhere.

use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use parking_lot::Condvar;
use parking_lot::Mutex;
use tracing::debug;
use tracing::error;

use super::Task;
use crate::PoolError;

pub type WorkerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
    Stopping,
    Stopped,
}

struct Slot {
    task: Option<Task>,
    state: WorkerState,
    stopping: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    wakeup: Condvar,
}

pub struct Worker {
    id: WorkerId,
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Spawns the worker thread. Each time the worker becomes idle again it
    /// announces its id on `idle_tx`.
    pub(crate) fn spawn(
        id: WorkerId,
        idle_tx: Sender<WorkerId>,
    ) -> Result<Arc<Self>, PoolError> {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                task: None,
                state: WorkerState::Idle,
                stopping: false,
            }),
            wakeup: Condvar::new(),
        });

        let thread_shared = shared.clone();
        let handle = thread::Builder::new()
            .name(format!("ddb-worker-{id}"))
            .spawn(move || run_loop(id, thread_shared, idle_tx))
            .map_err(PoolError::WorkerSpawn)?;

        Ok(Arc::new(Self {
            id,
            shared,
            handle: Mutex::new(Some(handle)),
        }))
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.shared.slot.lock().state
    }

    pub fn is_idle(&self) -> bool {
        self.state() == WorkerState::Idle
    }

    /// Hands `task` to this worker.
    ///
    /// Fails when the worker already holds a task or is stopping; the task is
    /// returned untouched in that case.
    pub fn assign(
        &self,
        task: Task,
    ) -> Result<(), Task> {
        let mut slot = self.shared.slot.lock();
        if slot.state != WorkerState::Idle || slot.task.is_some() {
            return Err(task);
        }
        slot.task = Some(task);
        slot.state = WorkerState::Busy;
        drop(slot);

        self.shared.wakeup.notify_one();
        Ok(())
    }

    /// Marks the worker non-accepting and wakes it. Does not wait.
    pub(crate) fn request_stop(&self) {
        let mut slot = self.shared.slot.lock();
        slot.stopping = true;
        if slot.state == WorkerState::Idle {
            slot.state = WorkerState::Stopping;
        }
        drop(slot);

        self.shared.wakeup.notify_all();
    }

    /// Waits for the worker thread to exit.
    ///
    /// Blocks for as long as the current task runs; a task blocked on I/O keeps
    /// the caller blocked too.
    pub(crate) fn join(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!(worker_id = self.id, "worker thread panicked");
            }
        }
        self.shared.slot.lock().state = WorkerState::Stopped;
    }

    /// `request_stop` followed by `join`.
    pub fn stop(&self) {
        self.request_stop();
        self.join();
    }
}

fn run_loop(
    id: WorkerId,
    shared: Arc<Shared>,
    idle_tx: Sender<WorkerId>,
) {
    debug!(worker_id = id, "worker started");
    loop {
        let task = {
            let mut slot = shared.slot.lock();
            while slot.task.is_none() && !slot.stopping {
                shared.wakeup.wait(&mut slot);
            }
            match slot.task.take() {
                Some(task) => task,
                // stopping with nothing left to run
                None => break,
            }
        };

        let task_id = task.id();
        debug!(worker_id = id, task_id, "running task");
        if panic::catch_unwind(AssertUnwindSafe(|| task.run())).is_err() {
            error!(worker_id = id, task_id, "task panicked");
        }

        let stopping = {
            let mut slot = shared.slot.lock();
            slot.state = if slot.stopping {
                WorkerState::Stopping
            } else {
                WorkerState::Idle
            };
            slot.stopping
        };
        if stopping {
            break;
        }
        // The receiver only disappears with the pool itself.
        let _ = idle_tx.send(id);
    }
    debug!(worker_id = id, "worker exited");
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Detached threads still exit once their current task returns.
        self.request_stop();
    }
}
