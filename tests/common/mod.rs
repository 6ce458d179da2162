use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use ddb_server::query::Catalog;
use ddb_server::server::Server;
use ddb_server::DocumentRecord;
use ddb_server::HeartbeatConfig;
use ddb_server::PoolConfig;
use ddb_server::ServerConfig;

pub const IO_TIMEOUT: Duration = Duration::from_secs(5);

pub fn test_config(
    pool: PoolConfig,
    heartbeat: HeartbeatConfig,
) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.pool = pool;
    config.heartbeat = heartbeat;
    config
}

pub fn small_pool(
    max: usize,
    min: usize,
    initial: usize,
) -> PoolConfig {
    PoolConfig {
        max_workers: max,
        min_workers: min,
        initial_workers: initial,
        step: 1,
        resize_interval_in_ms: 100,
        growth_factor: 10,
    }
}

pub fn relaxed_heartbeat() -> HeartbeatConfig {
    HeartbeatConfig {
        sweep_interval_in_ms: 5000,
        miss_threshold: 4,
    }
}

pub fn sample_catalog() -> Catalog {
    let record = |year: u32, author: &str, title: &str| DocumentRecord {
        year,
        author: author.to_string(),
        title: title.to_string(),
    };
    Catalog::new(vec![
        record(2019, "alice", "Thread pools"),
        record(2001, "bob", "Sockets"),
    ])
}

/// Binds a server on an ephemeral loopback port and starts accepting.
pub fn start_server(config: ServerConfig) -> (Arc<Server>, SocketAddr) {
    let server = Arc::new(Server::bind(config, Arc::new(sample_catalog())).expect("server binds"));
    let addr = server.local_addr().expect("local addr");
    server.spawn_acceptor().expect("acceptor starts");
    (server, addr)
}

pub fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(IO_TIMEOUT)).unwrap();
    stream.set_nodelay(true).unwrap();
    stream
}

pub fn request(
    client: &mut TcpStream,
    payload: &str,
) -> String {
    client.write_all(payload.as_bytes()).expect("send request");
    let mut buf = [0u8; 4096];
    let n = client.read(&mut buf).expect("read response");
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

pub fn wait_until(
    timeout: Duration,
    mut condition: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
