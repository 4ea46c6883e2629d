//! Shared fixtures for the integration flows.

use iris_telemetry::{init_logging, log_event, TelemetryConfig};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

static LOGGING: Once = Once::new();

/// Install a quiet subscriber once per test binary.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        // Another harness may already own the global subscriber.
        let _ = init_logging(&TelemetryConfig::for_tests());
    });
}

/// A UDP peer on loopback that sends every datagram straight back.
pub struct EchoPeer {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    echoed: Arc<AtomicUsize>,
    thread: Option<JoinHandle<()>>,
}

impl EchoPeer {
    /// Bind on an ephemeral loopback port and start echoing.
    pub fn spawn() -> io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0")?;
        socket.set_read_timeout(Some(Duration::from_millis(5)))?;
        let addr = socket.local_addr()?;
        log_event!(debug, "echo-peer", "Listening", addr = %addr);

        let running = Arc::new(AtomicBool::new(true));
        let echoed = Arc::new(AtomicUsize::new(0));
        let flag = running.clone();
        let count = echoed.clone();

        let thread = thread::Builder::new()
            .name("echo-peer".to_string())
            .spawn(move || {
                let mut buf = [0u8; 2048];
                while flag.load(Ordering::Acquire) {
                    match socket.recv_from(&mut buf) {
                        Ok((len, from)) => {
                            if socket.send_to(&buf[..len], from).is_ok() {
                                count.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        Err(e)
                            if matches!(
                                e.kind(),
                                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                            ) => {}
                        Err(e) => {
                            log_event!(warn, "echo-peer", "recv failed", error = %e);
                        }
                    }
                }
            })?;

        Ok(Self {
            addr,
            running,
            echoed,
            thread: Some(thread),
        })
    }

    /// Loopback address of the peer.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Datagrams echoed so far.
    pub fn echoed(&self) -> usize {
        self.echoed.load(Ordering::Relaxed)
    }
}

impl Drop for EchoPeer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Poll `check` until it yields a value or `timeout` elapses.
pub fn poll_until<T>(timeout: Duration, mut check: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = check() {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_peer_returns_datagram() {
        init_test_logging();
        let peer = EchoPeer::spawn().unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        client.send_to(b"ping", peer.addr()).unwrap();
        let mut buf = [0u8; 16];
        let (len, from) = client.recv_from(&mut buf).unwrap();

        assert_eq!(&buf[..len], b"ping");
        assert_eq!(from, peer.addr());
        let counted = poll_until(Duration::from_secs(1), || (peer.echoed() == 1).then_some(()));
        assert!(counted.is_some());
    }
}
