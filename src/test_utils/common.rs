use std::io::Read;
use std::io::Write;
use std::net::TcpListener;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use std::time::Instant;

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub(crate) fn wait_until(
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

/// Returns a connected `(client, server)` loopback socket pair.
pub(crate) fn socket_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let client = TcpStream::connect(addr).expect("connect loopback");
    let (server, _) = listener.accept().expect("accept loopback");
    (client, server)
}

/// Sends `request` and reads one response chunk.
pub(crate) fn round_trip(
    client: &mut TcpStream,
    request: &str,
) -> String {
    client.write_all(request.as_bytes()).expect("write request");
    let mut buf = [0u8; 4096];
    let n = client.read(&mut buf).expect("read response");
    String::from_utf8_lossy(&buf[..n]).into_owned()
}
