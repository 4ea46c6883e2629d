//! In-process endpoint.

use crate::error::NetworkError;
use crate::ports::{EndpointKind, NetworkEndpoint};
use crate::DEFAULT_POLL_TIMEOUT_MS;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// In-memory network endpoint for testing without sockets.
///
/// Sent datagrams are recorded; inbound datagrams are injected by the test.
/// In echo mode every sent datagram is also queued back as if the target had
/// replied with the same bytes.
#[derive(Debug)]
pub struct MemoryEndpoint {
    kind: EndpointKind,
    local_addr: SocketAddr,
    echo: bool,
    inbox: Mutex<VecDeque<(Vec<u8>, SocketAddr)>>,
    sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    poll_timeout: Mutex<Duration>,
    closed: AtomicBool,
}

impl MemoryEndpoint {
    /// Create a datagram endpoint bound to `127.0.0.1:0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: EndpointKind::Datagram,
            local_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            echo: false,
            inbox: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            poll_timeout: Mutex::new(Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS)),
            closed: AtomicBool::new(false),
        }
    }

    /// Create an endpoint whose peers echo every datagram back.
    #[must_use]
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    /// Report a different transport kind.
    #[must_use]
    pub fn with_kind(mut self, kind: EndpointKind) -> Self {
        self.kind = kind;
        self
    }

    /// Report a different local address.
    #[must_use]
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = addr;
        self
    }

    /// Queue a datagram as if it arrived from `sender`.
    pub fn inject(&self, payload: impl Into<Vec<u8>>, sender: SocketAddr) {
        self.inbox.lock().push_back((payload.into(), sender));
    }

    /// Datagrams sent so far, oldest first.
    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.sent.lock().clone()
    }

    /// Number of datagrams waiting to be received.
    pub fn pending(&self) -> usize {
        self.inbox.lock().len()
    }

    /// How long an empty receive waits.
    pub fn poll_timeout(&self) -> Duration {
        *self.poll_timeout.lock()
    }

    fn ensure_open(&self) -> Result<(), NetworkError> {
        if self.is_closed() {
            Err(NetworkError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkEndpoint for MemoryEndpoint {
    fn kind(&self) -> EndpointKind {
        self.kind
    }

    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<usize, NetworkError> {
        self.ensure_open()?;
        self.sent.lock().push((payload.to_vec(), target));
        if self.echo {
            self.inbox.lock().push_back((payload.to_vec(), target));
        }
        Ok(payload.len())
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, NetworkError> {
        self.ensure_open()?;
        let next = self.inbox.lock().pop_front();
        match next {
            Some((payload, sender)) => {
                // Oversized datagrams are truncated like a real socket would.
                let len = payload.len().min(buf.len());
                buf[..len].copy_from_slice(&payload[..len]);
                Ok(Some((len, sender)))
            }
            None => {
                let wait = *self.poll_timeout.lock();
                thread::sleep(wait);
                Ok(None)
            }
        }
    }

    fn set_poll_timeout(&self, timeout: Duration) -> Result<(), NetworkError> {
        self.ensure_open()?;
        *self.poll_timeout.lock() = timeout;
        Ok(())
    }

    fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.ensure_open()?;
        Ok(self.local_addr)
    }

    fn close(&self) -> Result<(), NetworkError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            Err(NetworkError::AlreadyClosed)
        } else {
            Ok(())
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
