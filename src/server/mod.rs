//! TCP front end: the accept loop, per-connection sessions and the
//! [`Server`] facade wiring them to the pool and the liveness sweep.
mod acceptor;
mod connection;
pub mod protocol;

pub use acceptor::*;
pub use connection::*;


use std::net::SocketAddr;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use socket2::Domain;
use socket2::Protocol;
use socket2::Socket;
use socket2::Type;
use tracing::info;

use crate::liveness::HeartbeatSweeper;
use crate::liveness::LivenessRegistry;
use crate::pool::PoolStatus;
use crate::pool::ThreadPool;
use crate::query::QueryExecutor;
use crate::Error;
use crate::ListenerConfig;
use crate::Result;
use crate::ServerConfig;

const ACCEPTOR_THREAD: &str = "ddb-acceptor";

pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    pool: Arc<ThreadPool>,
    liveness: Arc<LivenessRegistry>,
    sweeper: HeartbeatSweeper,
    executor: Arc<dyn QueryExecutor>,
}

impl Server {
    /// Performs every setup step that can fail: validates `config`, binds
    /// the listening socket, creates the pool and starts the liveness sweep.
    pub fn bind(
        config: ServerConfig,
        executor: Arc<dyn QueryExecutor>,
    ) -> Result<Self> {
        let config = config.validate()?;
        let listener = bind_listener(&config.listener)?;
        let pool = Arc::new(ThreadPool::new(config.pool.clone())?);
        let liveness = Arc::new(LivenessRegistry::new(config.heartbeat.miss_threshold));
        let sweeper = HeartbeatSweeper::start(liveness.clone(), &config.heartbeat)?;

        info!("server listening on {}", listener.local_addr()?);
        Ok(Self {
            config,
            listener,
            pool,
            liveness,
            sweeper,
            executor,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn pool(&self) -> &Arc<ThreadPool> {
        &self.pool
    }

    pub fn liveness(&self) -> &Arc<LivenessRegistry> {
        &self.liveness
    }

    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Builds an accept loop sharing this server's listener.
    pub fn acceptor(&self) -> Result<Acceptor> {
        Ok(Acceptor::new(
            self.listener.try_clone()?,
            self.pool.clone(),
            self.liveness.clone(),
            self.executor.clone(),
            self.config.listener.recv_buffer_size,
        ))
    }

    /// Runs the accept loop on the calling thread. Only returns on setup error.
    pub fn serve(&self) -> Result<()> {
        let acceptor = self.acceptor()?;
        acceptor.run()
    }

    /// Runs the accept loop on a dedicated thread.
    pub fn spawn_acceptor(&self) -> Result<JoinHandle<()>> {
        let acceptor = self.acceptor()?;
        thread::Builder::new()
            .name(ACCEPTOR_THREAD.to_string())
            .spawn(move || {
                acceptor.run();
            })
            .map_err(|source| Error::ThreadSpawn {
                name: ACCEPTOR_THREAD.to_string(),
                source,
            })
    }

    /// Stops dispatching newly accepted connections.
    pub fn pause(&self) {
        self.pool.stop();
    }

    pub fn resume(&self) {
        self.pool.start();
    }

    /// Closes pool intake, stops the sweep, force-closes every live connection
    /// and shuts the pool down. The accept loop keeps running, but new
    /// connections are dropped.
    ///
    /// Intake closes first: the acceptor registers a connection before
    /// queuing it, so every session that can still reach a worker is already
    /// in the registry when `close_all` runs.
    pub fn shutdown(&self) {
        self.pool.close_intake();
        self.sweeper.stop();
        let closed = self.liveness.close_all();
        info!("closed {} live connections", closed);
        self.pool.shutdown();
    }
}

/// Create, bind and listen with the configured backlog.
fn bind_listener(config: &ListenerConfig) -> Result<TcpListener> {
    let addr = config.socket_addr()?;
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(config.backlog)?;
    Ok(socket.into())
}
