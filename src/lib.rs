//! Connection-serving core of a document query server.
//!
//! An [`Acceptor`](server::Acceptor) registers each TCP connection with the
//! [`LivenessRegistry`](liveness::LivenessRegistry) and queues one
//! [`ConnectionTask`](server::ConnectionTask) per connection on an elastic
//! [`ThreadPool`](pool::ThreadPool). The session keeps its worker for the
//! whole connection lifetime, so the pool size bounds concurrent
//! connections. A [`HeartbeatSweeper`](liveness::HeartbeatSweeper)
//! force-closes connections that go silent.

mod config;
pub mod constants;
mod errors;
pub mod liveness;
pub mod metrics;
pub mod pool;
pub mod query;
pub mod server;

pub use config::*;
pub use errors::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
