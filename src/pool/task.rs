use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// A unit of work executed by exactly one [`Worker`](super::Worker).
///
/// Lifecycle: queued -> assigned -> running -> finished. The closure owns every
/// piece of state it needs, so the task is released as soon as `run` returns.
pub struct Task {
    id: u64,
    job: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    pub fn new<F>(job: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            job: Box::new(job),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn run(self) {
        (self.job)()
    }
}

impl fmt::Debug for Task {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish()
    }
}
