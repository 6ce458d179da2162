//! Per-connection session.
//!
//! receive -> reset liveness -> parse -> dispatch -> respond, looped until a
//! read fails, the peer hangs up or the liveness entry disappears. A session
//! occupies its worker for the whole connection lifetime.

use std::io;
use std::io::Read;
use std::io::Write;
use std::net::Shutdown;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::protocol::parse_request;
use super::protocol::render_response;
use super::protocol::wrong_option;
use super::protocol::Request;
use crate::liveness::ConnectionId;
use crate::liveness::LivenessRegistry;
use crate::metrics;
use crate::pool::Task;
use crate::query::QueryExecutor;
use crate::ConnectionError;

pub struct ConnectionTask {
    id: ConnectionId,
    stream: TcpStream,
    peer: SocketAddr,
    liveness: Arc<LivenessRegistry>,
    executor: Arc<dyn QueryExecutor>,
    buffer: Vec<u8>,
}

impl ConnectionTask {
    pub fn new(
        id: ConnectionId,
        stream: TcpStream,
        peer: SocketAddr,
        liveness: Arc<LivenessRegistry>,
        executor: Arc<dyn QueryExecutor>,
        recv_buffer_size: usize,
    ) -> Self {
        Self {
            id,
            stream,
            peer,
            liveness,
            executor,
            buffer: vec![0; recv_buffer_size],
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Wraps the session as a pool task.
    pub fn into_task(self) -> Task {
        Task::new(move || self.run())
    }

    /// Serves the connection until it ends, then closes it.
    pub fn run(mut self) {
        debug!(conn_id = %self.id, peer = %self.peer, "session started");
        let reason = self.serve();
        match &reason {
            ConnectionError::PeerClosed => info!(conn_id = %self.id, peer = %self.peer, "connection closed"),
            other => info!(conn_id = %self.id, peer = %self.peer, "connection terminated: {}", other),
        }
        self.close();
    }

    fn serve(&mut self) -> ConnectionError {
        loop {
            let n = match self.receive() {
                Ok(n) => n,
                Err(e) => return e,
            };

            if !self.liveness.reset(self.id) {
                return ConnectionError::Untracked(self.id);
            }

            let response = match parse_request(&self.buffer[..n]) {
                Request::KeepAlive => continue,
                Request::Query(query) => {
                    metrics::REQUESTS_TOTAL
                        .with_label_values(&[&query.opcode().to_string()])
                        .inc();
                    debug!(conn_id = %self.id, ?query, "dispatching");
                    render_response(self.executor.execute(&query))
                }
                Request::Invalid(reason) => {
                    metrics::REQUESTS_TOTAL.with_label_values(&["invalid"]).inc();
                    debug!(conn_id = %self.id, ?reason, "rejecting request");
                    wrong_option()
                }
            };

            self.respond(&response);
        }
    }

    fn receive(&mut self) -> Result<usize, ConnectionError> {
        loop {
            match self.stream.read(&mut self.buffer) {
                Ok(0) => return Err(ConnectionError::PeerClosed),
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ConnectionError::Read(e)),
            }
        }
    }

    /// A failed send is logged only; the next receive decides whether the
    /// session goes on.
    fn respond(
        &mut self,
        response: &str,
    ) {
        if let Err(e) = self.stream.write_all(response.as_bytes()) {
            warn!(conn_id = %self.id, peer = %self.peer, "send back failed: {}", e);
        }
    }

    fn close(self) {
        self.liveness.remove(self.id);
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            // already shut down by the sweeper or the peer
            debug!(conn_id = %self.id, "shutdown: {}", e);
        }
        // socket closed when `stream` drops here
    }
}
