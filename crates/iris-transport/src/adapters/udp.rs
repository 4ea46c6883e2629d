//! UDP endpoint over `std::net::UdpSocket`.

use crate::error::NetworkError;
use crate::ports::{EndpointKind, NetworkEndpoint};
use crate::DEFAULT_POLL_TIMEOUT_MS;
use parking_lot::RwLock;
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket as StdUdpSocket};
use std::time::Duration;

/// UDP-based network endpoint.
///
/// Receives block for at most the poll timeout (socket read timeout), so a
/// receive step never starves the send step of a sequential engine.
///
/// # Example
///
/// ```rust,no_run
/// use iris_transport::{NetworkEndpoint, UdpEndpoint};
///
/// let endpoint = UdpEndpoint::bind("127.0.0.1:0")?;
/// let target = "127.0.0.1:9999".parse().unwrap();
/// endpoint.send_to(b"ping", target)?;
/// # Ok::<(), iris_transport::NetworkError>(())
/// ```
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: RwLock<Option<StdUdpSocket>>,
    local_addr: SocketAddr,
}

impl UdpEndpoint {
    /// Bind to a local address and create the endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if socket binding fails.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, NetworkError> {
        Self::from_socket(StdUdpSocket::bind(addr)?)
    }

    /// Wrap an already bound socket.
    ///
    /// The socket is switched to blocking mode with the default poll timeout.
    pub fn from_socket(socket: StdUdpSocket) -> Result<Self, NetworkError> {
        socket.set_nonblocking(false)?;
        socket.set_read_timeout(Some(Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS)))?;
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket: RwLock::new(Some(socket)),
            local_addr,
        })
    }
}

impl NetworkEndpoint for UdpEndpoint {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Datagram
    }

    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<usize, NetworkError> {
        let guard = self.socket.read();
        let socket = guard.as_ref().ok_or(NetworkError::Closed)?;
        Ok(socket.send_to(payload, target)?)
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, NetworkError> {
        let guard = self.socket.read();
        let socket = guard.as_ref().ok_or(NetworkError::Closed)?;
        match socket.recv_from(buf) {
            Ok((len, sender)) => Ok(Some((len, sender))),
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => Ok(None),
                _ => Err(NetworkError::Io(e)),
            },
        }
    }

    fn set_poll_timeout(&self, timeout: Duration) -> Result<(), NetworkError> {
        let guard = self.socket.read();
        let socket = guard.as_ref().ok_or(NetworkError::Closed)?;
        // A zero read timeout is rejected by the OS layer with InvalidInput.
        socket.set_read_timeout(Some(timeout))?;
        Ok(())
    }

    fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        if self.is_closed() {
            return Err(NetworkError::Closed);
        }
        Ok(self.local_addr)
    }

    fn close(&self) -> Result<(), NetworkError> {
        // Dropping the socket releases the descriptor.
        match self.socket.write().take() {
            Some(_) => Ok(()),
            None => Err(NetworkError::AlreadyClosed),
        }
    }

    fn is_closed(&self) -> bool {
        self.socket.read().is_none()
    }
}
