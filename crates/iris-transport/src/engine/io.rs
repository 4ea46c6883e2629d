//! Send and receive steps shared by every strategy.

use crate::error::{EngineError, EngineResult, NetworkError, SendError};
use crate::ports::{MessageDestination, MessageSource, NetworkEndpoint};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one send step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Outbound source was empty
    Idle,
    /// One datagram went out
    Sent {
        /// Bytes written
        bytes: usize,
    },
}

/// Result of one receive step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Nothing arrived within the poll timeout
    Idle,
    /// A datagram was turned into a message and handed to the destination
    Delivered,
    /// A datagram arrived but was dropped (malformed, or rejected by the destination)
    Discarded,
}

/// The endpoints and queues an engine moves messages between.
pub struct EngineIo {
    listen: Arc<dyn NetworkEndpoint>,
    send: Arc<dyn NetworkEndpoint>,
    inbound: Arc<dyn MessageDestination>,
    outbound: Arc<dyn MessageSource>,
    max_datagram_size: usize,
}

impl EngineIo {
    pub(crate) fn new(
        listen: Arc<dyn NetworkEndpoint>,
        send: Arc<dyn NetworkEndpoint>,
        inbound: Arc<dyn MessageDestination>,
        outbound: Arc<dyn MessageSource>,
        max_datagram_size: usize,
    ) -> Self {
        Self {
            listen,
            send,
            inbound,
            outbound,
            max_datagram_size,
        }
    }

    /// Endpoint read by the receive step.
    pub fn listen_endpoint(&self) -> &Arc<dyn NetworkEndpoint> {
        &self.listen
    }

    /// Endpoint written by the send step.
    pub fn send_endpoint(&self) -> &Arc<dyn NetworkEndpoint> {
        &self.send
    }

    /// Whether one endpoint serves both directions.
    pub fn is_single_socket(&self) -> bool {
        same_endpoint(&self.listen, &self.send)
    }

    /// Largest datagram read or written.
    pub fn max_datagram_size(&self) -> usize {
        self.max_datagram_size
    }

    /// Buffer sized for one receive step.
    pub fn receive_buffer(&self) -> Vec<u8> {
        vec![0u8; self.max_datagram_size]
    }

    /// Take the next outbound message, if any, and transmit it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Send`] if the destination cannot be resolved,
    /// the payload is too large, or the endpoint fails. The message is dropped.
    pub fn send_step(&self) -> EngineResult<SendOutcome> {
        let Some(message) = self.outbound.next_message() else {
            return Ok(SendOutcome::Idle);
        };
        let (payload, address) = message.into_parts();
        let bytes = payload.as_bytes();

        if bytes.len() > self.max_datagram_size {
            return Err(SendError {
                address,
                source: NetworkError::MessageTooLarge {
                    size: bytes.len(),
                    max: self.max_datagram_size,
                },
            }
            .into());
        }

        let target = match address.resolve() {
            Ok(target) => target,
            Err(source) => return Err(SendError { address, source }.into()),
        };

        match self.send.send_to(bytes, target) {
            Ok(sent) => {
                debug!(peer = %target, bytes = sent, "[engine] Datagram sent");
                Ok(SendOutcome::Sent { bytes: sent })
            }
            Err(source) => Err(SendError { address, source }.into()),
        }
    }

    /// Poll for one datagram and hand it to the inbound destination.
    ///
    /// `buf` must be at least [`max_datagram_size`](Self::max_datagram_size)
    /// long to avoid truncation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Receive`] only for endpoint faults. Malformed
    /// datagrams and rejected hand-offs are logged and reported as
    /// [`ReceiveOutcome::Discarded`].
    pub fn receive_step(&self, buf: &mut [u8]) -> EngineResult<ReceiveOutcome> {
        let (len, sender) = match self.listen.recv_from(buf) {
            Ok(Some(datagram)) => datagram,
            Ok(None) => return Ok(ReceiveOutcome::Idle),
            Err(e) => return Err(EngineError::Receive(e)),
        };

        let message = match self.inbound.build_message(buf[..len].to_vec(), sender) {
            Ok(message) => message,
            Err(e) => {
                warn!(peer = %sender, bytes = len, error = %e, "[engine] Discarding malformed datagram");
                return Ok(ReceiveOutcome::Discarded);
            }
        };

        match self.inbound.accept(message) {
            Ok(()) => {
                debug!(peer = %sender, bytes = len, "[engine] Datagram received");
                Ok(ReceiveOutcome::Delivered)
            }
            Err(e) => {
                warn!(peer = %sender, error = %e, "[engine] Inbound destination rejected message");
                Ok(ReceiveOutcome::Discarded)
            }
        }
    }
}

impl fmt::Debug for EngineIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineIo")
            .field("listen", &self.listen)
            .field("send", &self.send)
            .field("max_datagram_size", &self.max_datagram_size)
            .finish_non_exhaustive()
    }
}

/// Whether two endpoint handles point at the same endpoint.
pub(crate) fn same_endpoint(a: &Arc<dyn NetworkEndpoint>, b: &Arc<dyn NetworkEndpoint>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryEndpoint;
    use crate::domain::{Address, Message, MessageKind, Mode};
    use crate::queue::LockedMessageQueue;
    use std::net::SocketAddr;

    struct Fixture {
        endpoint: Arc<MemoryEndpoint>,
        inbound: Arc<LockedMessageQueue>,
        outbound: Arc<LockedMessageQueue>,
        io: EngineIo,
    }

    fn fixture(endpoint: MemoryEndpoint, inbound_kind: MessageKind) -> Fixture {
        let endpoint = Arc::new(endpoint);
        let inbound = Arc::new(LockedMessageQueue::new(inbound_kind));
        let outbound = Arc::new(LockedMessageQueue::new(MessageKind::Any));
        let io = EngineIo::new(
            endpoint.clone(),
            endpoint.clone(),
            inbound.clone(),
            outbound.clone(),
            crate::MAX_DATAGRAM_SIZE,
        );
        Fixture {
            endpoint,
            inbound,
            outbound,
            io,
        }
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    #[test]
    fn test_send_step_idle_on_empty_source() {
        let f = fixture(MemoryEndpoint::new(), MessageKind::Binary);
        assert_eq!(f.io.send_step().unwrap(), SendOutcome::Idle);
        assert!(f.endpoint.sent().is_empty());
        assert!(f.io.is_single_socket());
    }

    #[test]
    fn test_send_step_transmits_payload() {
        let f = fixture(MemoryEndpoint::new(), MessageKind::Binary);
        let address = Address::from(peer());
        f.outbound
            .enqueue(Message::binary(b"ping".to_vec(), address).unwrap())
            .unwrap();

        assert_eq!(f.io.send_step().unwrap(), SendOutcome::Sent { bytes: 4 });
        assert_eq!(f.endpoint.sent(), vec![(b"ping".to_vec(), peer())]);
        assert!(f.outbound.is_empty());
    }

    #[test]
    fn test_send_step_rejects_oversized_payload() {
        let f = fixture(MemoryEndpoint::new(), MessageKind::Binary);
        let big = vec![1u8; crate::MAX_DATAGRAM_SIZE + 1];
        f.outbound
            .enqueue(Message::binary(big, Address::from(peer())).unwrap())
            .unwrap();

        let err = f.io.send_step().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Send(SendError {
                source: NetworkError::MessageTooLarge { .. },
                ..
            })
        ));
        assert!(f.endpoint.sent().is_empty());
    }

    #[test]
    fn test_send_step_reports_endpoint_fault() {
        let f = fixture(MemoryEndpoint::new(), MessageKind::Binary);
        f.endpoint.close().unwrap();
        f.outbound
            .enqueue(Message::text("x", Address::from(peer())).unwrap())
            .unwrap();
        assert!(matches!(f.io.send_step(), Err(EngineError::Send(_))));
    }

    #[test]
    fn test_receive_step_idle_without_data() {
        let f = fixture(MemoryEndpoint::new(), MessageKind::Binary);
        f.endpoint
            .set_poll_timeout(std::time::Duration::from_millis(1))
            .unwrap();
        let mut buf = f.io.receive_buffer();
        assert_eq!(f.io.receive_step(&mut buf).unwrap(), ReceiveOutcome::Idle);
    }

    #[test]
    fn test_receive_step_delivers_message() {
        let f = fixture(MemoryEndpoint::new(), MessageKind::Binary);
        f.endpoint.inject(b"pong".to_vec(), peer());
        let mut buf = f.io.receive_buffer();

        assert_eq!(
            f.io.receive_step(&mut buf).unwrap(),
            ReceiveOutcome::Delivered
        );
        let msg = f.inbound.dequeue().unwrap();
        assert_eq!(msg.mode(), Mode::Binary);
        assert_eq!(msg.payload().as_bytes(), b"pong");
        assert_eq!(msg.address(), &Address::from(peer()));
    }

    #[test]
    fn test_receive_step_discards_malformed_datagram() {
        let f = fixture(MemoryEndpoint::new(), MessageKind::Text);
        f.endpoint.inject(vec![0xff, 0xfe], peer());
        let mut buf = f.io.receive_buffer();

        assert_eq!(
            f.io.receive_step(&mut buf).unwrap(),
            ReceiveOutcome::Discarded
        );
        assert!(f.inbound.is_empty());
    }

    #[test]
    fn test_receive_step_reports_closed_endpoint() {
        let f = fixture(MemoryEndpoint::new(), MessageKind::Binary);
        f.endpoint.close().unwrap();
        let mut buf = f.io.receive_buffer();
        assert!(matches!(
            f.io.receive_step(&mut buf),
            Err(EngineError::Receive(NetworkError::Closed))
        ));
    }
}
