use std::net::SocketAddr;
use std::net::TcpListener;
use std::net::TcpStream;
use std::sync::Arc;

use tracing::error;
use tracing::info;
use tracing::warn;

use super::ConnectionTask;
use crate::liveness::ConnectionId;
use crate::liveness::LivenessRegistry;
use crate::pool::ThreadPool;
use crate::query::QueryExecutor;
use crate::Result;

/// Blocking accept loop.
///
/// Each accepted connection is registered for liveness tracking and queued on
/// the pool as one [`ConnectionTask`]. The loop has no shutdown signal of its
/// own and runs for as long as the process does.
pub struct Acceptor {
    listener: TcpListener,
    pool: Arc<ThreadPool>,
    liveness: Arc<LivenessRegistry>,
    executor: Arc<dyn QueryExecutor>,
    recv_buffer_size: usize,
}

impl Acceptor {
    pub fn new(
        listener: TcpListener,
        pool: Arc<ThreadPool>,
        liveness: Arc<LivenessRegistry>,
        executor: Arc<dyn QueryExecutor>,
        recv_buffer_size: usize,
    ) -> Self {
        Self {
            listener,
            pool,
            liveness,
            executor,
            recv_buffer_size,
        }
    }

    pub fn run(&self) -> ! {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = self.on_accept(stream, peer) {
                        error!(peer = %peer, "failed to hand off connection: {}", e);
                    }
                }
                Err(e) => warn!("accept failed: {}", e),
            }
        }
    }

    fn on_accept(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
    ) -> Result<()> {
        let id = ConnectionId::next();
        self.liveness.register(id, Box::new(stream.try_clone()?));
        info!(conn_id = %id, peer = %peer, "accepted connection");

        let task = ConnectionTask::new(
            id,
            stream,
            peer,
            self.liveness.clone(),
            self.executor.clone(),
            self.recv_buffer_size,
        );
        if let Err(e) = self.pool.add_task(task.into_task()) {
            // the rejected task drops and closes the socket
            self.liveness.remove(id);
            return Err(e);
        }
        Ok(())
    }
}
