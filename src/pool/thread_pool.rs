//! Dispatcher: matches queued tasks to idle workers.
//!
//! Threads owned by the pool:
//! - one dispatch loop popping tasks in FIFO order
//! - one size controller tick loop
//! - one thread per live worker
//!
//! `stop`/`start` only gate the dispatch of *new* tasks. `close_intake`
//! refuses new submissions for good. `shutdown` is one-way: it joins both
//! loops, then stops every worker after its current task returns. Tasks
//! still queued at that point are dropped.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::bounded;
use crossbeam_channel::select;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use parking_lot::Condvar;
use parking_lot::Mutex;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::IdleRegistry;
use super::ResizeDecision;
use super::SizeController;
use super::Task;
use crate::metrics;
use crate::Error;
use crate::PoolConfig;
use crate::PoolError;
use crate::Result;

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub workers: usize,
    pub idle: usize,
    pub pending: usize,
    pub running: bool,
    pub terminated: bool,
}

struct TaskQueue {
    tasks: VecDeque<Task>,
    /// The dispatcher popped a task and is waiting for a worker to take it.
    in_hand: bool,
    running: bool,
    /// `add_task` is refused once this is cleared.
    accepting: bool,
    shutdown: bool,
}

impl TaskQueue {
    /// Tasks not yet handed to a worker, including the one the dispatcher holds.
    fn depth(&self) -> usize {
        self.tasks.len() + usize::from(self.in_hand)
    }
}

struct PoolInner {
    queue: Mutex<TaskQueue>,
    queue_ready: Condvar,
    registry: IdleRegistry,
    shutdown_rx: Receiver<()>,
}

#[derive(Default)]
struct LoopHandles {
    dispatcher: Option<JoinHandle<()>>,
    controller: Option<JoinHandle<()>>,
}

pub struct ThreadPool {
    inner: Arc<PoolInner>,
    handles: Mutex<LoopHandles>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    terminated: AtomicBool,
}

impl ThreadPool {
    /// Validates `config`, spawns `initial_workers` workers and starts the
    /// dispatch and size controller loops. The pool starts in running state.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let registry = IdleRegistry::new();
        registry.grow(config.initial_workers)?;

        // Never sent on: dropping the sender is the shutdown broadcast.
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let inner = Arc::new(PoolInner {
            queue: Mutex::new(TaskQueue {
                tasks: VecDeque::new(),
                in_hand: false,
                running: false,
                accepting: true,
                shutdown: false,
            }),
            queue_ready: Condvar::new(),
            registry,
            shutdown_rx,
        });

        let dispatcher = {
            let inner = inner.clone();
            spawn_loop("ddb-dispatcher", move || dispatch_loop(inner))?
        };
        let controller = {
            let inner = inner.clone();
            let controller = SizeController::from_config(&config);
            let interval = config.resize_interval();
            spawn_loop("ddb-pool-sizer", move || control_loop(inner, controller, interval))?
        };

        info!(
            "thread pool created: initial={}, min={}, max={}, step={}",
            config.initial_workers, config.min_workers, config.max_workers, config.step
        );

        let pool = Self {
            inner,
            handles: Mutex::new(LoopHandles {
                dispatcher: Some(dispatcher),
                controller: Some(controller),
            }),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            terminated: AtomicBool::new(false),
        };
        pool.inner.publish_metrics();
        pool.start();
        Ok(pool)
    }

    /// Queues a task for execution.
    pub fn add_task(
        &self,
        task: Task,
    ) -> Result<()> {
        let mut queue = self.inner.queue.lock();
        if queue.shutdown || !queue.accepting {
            return Err(PoolError::Terminated.into());
        }
        queue.tasks.push_back(task);
        metrics::PENDING_TASKS.set(queue.depth() as i64);
        drop(queue);

        self.inner.queue_ready.notify_one();
        Ok(())
    }

    /// Convenience wrapper around [`add_task`](Self::add_task).
    pub fn execute<F>(
        &self,
        job: F,
    ) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.add_task(Task::new(job))
    }

    /// Allows the dispatch loop to hand out tasks.
    pub fn start(&self) {
        self.inner.queue.lock().running = true;
        self.inner.queue_ready.notify_all();
        debug!("thread pool dispatch enabled");
    }

    /// Stops handing out new tasks. Tasks already running are not affected.
    pub fn stop(&self) {
        self.inner.queue.lock().running = false;
        debug!("thread pool dispatch paused");
    }

    /// Refuses every later `add_task` while queued and running tasks carry
    /// on. First step of a shutdown; cannot be undone.
    pub fn close_intake(&self) {
        self.inner.queue.lock().accepting = false;
        debug!("thread pool intake closed");
    }

    /// Irreversibly shuts the pool down.
    ///
    /// Blocks until every worker has finished its current task. Calling it
    /// again is a no-op.
    pub fn shutdown(&self) {
        {
            let mut queue = self.inner.queue.lock();
            if queue.shutdown {
                return;
            }
            queue.shutdown = true;
            queue.accepting = false;
        }
        self.inner.queue_ready.notify_all();
        drop(self.shutdown_tx.lock().take());

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in [handles.dispatcher, handles.controller].into_iter().flatten() {
            if handle.join().is_err() {
                error!("pool loop thread panicked");
            }
        }

        let abandoned = {
            let mut queue = self.inner.queue.lock();
            let abandoned = queue.tasks.len();
            queue.tasks.clear();
            abandoned
        };
        if abandoned > 0 {
            warn!("dropping {} pending tasks at shutdown", abandoned);
        }

        self.inner.registry.stop_all();
        self.terminated.store(true, Ordering::Release);
        self.inner.publish_metrics();
        info!("thread pool terminated");
    }

    pub fn worker_count(&self) -> usize {
        self.inner.registry.worker_count()
    }

    pub fn idle_count(&self) -> usize {
        self.inner.registry.idle_count()
    }

    /// Tasks submitted but not yet running on a worker.
    pub fn pending_count(&self) -> usize {
        self.inner.queue.lock().depth()
    }

    pub fn is_running(&self) -> bool {
        let queue = self.inner.queue.lock();
        queue.running && !queue.shutdown
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            workers: self.worker_count(),
            idle: self.idle_count(),
            pending: self.pending_count(),
            running: self.is_running(),
            terminated: self.is_terminated(),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl PoolInner {
    fn requeue_front(
        &self,
        task: Task,
    ) {
        let mut queue = self.queue.lock();
        queue.tasks.push_front(task);
        queue.in_hand = false;
        metrics::PENDING_TASKS.set(queue.depth() as i64);
    }

    fn handed_off(&self) {
        let mut queue = self.queue.lock();
        queue.in_hand = false;
        metrics::PENDING_TASKS.set(queue.depth() as i64);
    }

    fn resize(
        &self,
        controller: &SizeController,
    ) {
        let pending = self.queue.lock().depth();
        let idle = self.registry.idle_count();
        let current = self.registry.worker_count();

        match controller.decide(pending, idle, current) {
            ResizeDecision::Grow(n) => match self.registry.grow(n) {
                Ok(added) => info!(pending, idle, "pool grew by {} to {}", added, current + added),
                Err(e) => error!("pool grow failed: {}", e),
            },
            ResizeDecision::Shrink(n) => {
                let removed = self.registry.shrink(n);
                if removed > 0 {
                    info!(pending, idle, "pool shrank by {} to {}", removed, current - removed);
                }
            }
            ResizeDecision::Hold => {}
        }
        self.publish_metrics();
    }

    fn publish_metrics(&self) {
        metrics::POOL_WORKERS.set(self.registry.worker_count() as i64);
        metrics::POOL_IDLE_WORKERS.set(self.registry.idle_count() as i64);
        metrics::PENDING_TASKS.set(self.queue.lock().depth() as i64);
    }
}

fn spawn_loop<F>(
    name: &str,
    body: F,
) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map_err(|source| Error::ThreadSpawn {
            name: name.to_string(),
            source,
        })
}

fn dispatch_loop(inner: Arc<PoolInner>) {
    loop {
        let task = {
            let mut queue = inner.queue.lock();
            while !queue.shutdown && !(queue.running && !queue.tasks.is_empty()) {
                inner.queue_ready.wait(&mut queue);
            }
            if queue.shutdown {
                break;
            }
            match queue.tasks.pop_front() {
                Some(task) => {
                    queue.in_hand = true;
                    task
                }
                None => continue,
            }
        };

        let Some(worker) = inner.registry.acquire(&inner.shutdown_rx) else {
            inner.requeue_front(task);
            break;
        };

        match worker.assign(task) {
            Ok(()) => inner.handed_off(),
            Err(task) => {
                // Keep FIFO order: the task goes back to the head of the queue.
                debug!(worker_id = worker.id(), task_id = task.id(), "assign rejected, requeueing");
                inner.requeue_front(task);
            }
        }
    }
    debug!("dispatch loop exited");
}

fn control_loop(
    inner: Arc<PoolInner>,
    controller: SizeController,
    interval: Duration,
) {
    loop {
        select! {
            recv(inner.shutdown_rx) -> _ => break,
            default(interval) => inner.resize(&controller),
        }
    }
    debug!("size controller exited");
}
