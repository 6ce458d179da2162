//! Elastic worker pool.
//!
//! A [`ThreadPool`] owns a FIFO queue of [`Task`]s, a set of [`Worker`]
//! threads tracked by the [`IdleRegistry`], and a [`SizeController`] loop that
//! grows or shrinks the worker set between the configured bounds.
mod idle_registry;
mod size_controller;
mod task;
mod thread_pool;
mod worker;

pub use idle_registry::*;
pub use size_controller::*;
pub use task::*;
pub use thread_pool::*;
pub use worker::*;

#[cfg(test)]
mod thread_pool_test;
