//! # Message Queues
//!
//! FIFO hand-off points between pipeline stages. A queue is bound to a
//! [`MessageKind`] at construction and rejects messages of any other kind.
//!
//! - [`MessageQueue`]: plain queue for single-threaded use (`&mut self`)
//! - [`LockedMessageQueue`]: thread-safe queue; every operation goes through
//!   one internal mutex, so callers never lock around it

use crate::domain::{Address, Message, MessageKind};
use crate::error::{MessageError, QueueError};
use crate::ports::{MessageDestination, MessageSource};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;

/// Ordered FIFO container of messages of one kind.
///
/// Not thread-safe; wrap in [`LockedMessageQueue`] to share between stages.
#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: VecDeque<Message>,
    kind: MessageKind,
}

impl MessageQueue {
    /// Create an empty queue accepting `kind`.
    #[must_use]
    pub fn new(kind: MessageKind) -> Self {
        Self {
            messages: VecDeque::new(),
            kind,
        }
    }

    /// Kind this queue accepts.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Append to the tail.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::KindMismatch`] and leaves the queue unchanged if
    /// `message` is not of the configured kind. The message travels back in
    /// the error; see [`QueueError::into_message`].
    pub fn enqueue(&mut self, message: Message) -> Result<(), QueueError> {
        let message = check_kind(self.kind, message)?;
        self.messages.push_back(message);
        Ok(())
    }

    /// Remove and return the head, or `None` when empty. Never blocks.
    pub fn dequeue(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Number of queued messages. Diagnostics only, not for flow control.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Construct a message of this queue's kind from a received datagram.
    pub fn build_message(&self, raw: Vec<u8>, sender: SocketAddr) -> Result<Message, MessageError> {
        self.kind.build(raw, Address::from(sender))
    }
}

fn check_kind(kind: MessageKind, message: Message) -> Result<Message, QueueError> {
    if kind.accepts(&message) {
        Ok(message)
    } else {
        Err(QueueError::KindMismatch {
            expected: kind,
            actual: message.mode(),
            message: Box::new(message),
        })
    }
}

/// Thread-safe message queue.
///
/// Shared by exactly the two stages it connects, usually behind an `Arc`.
#[derive(Debug, Default)]
pub struct LockedMessageQueue {
    inner: Mutex<MessageQueue>,
    kind: MessageKind,
}

impl LockedMessageQueue {
    /// Create an empty queue accepting `kind`.
    #[must_use]
    pub fn new(kind: MessageKind) -> Self {
        Self {
            inner: Mutex::new(MessageQueue::new(kind)),
            kind,
        }
    }

    /// Kind this queue accepts.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Append to the tail; see [`MessageQueue::enqueue`].
    pub fn enqueue(&self, message: Message) -> Result<(), QueueError> {
        // Kind is immutable, so the check needs no lock.
        let message = check_kind(self.kind, message)?;
        self.inner.lock().messages.push_back(message);
        Ok(())
    }

    /// Remove and return the head, or `None` when empty. Never blocks on data.
    pub fn dequeue(&self) -> Option<Message> {
        self.inner.lock().dequeue()
    }

    /// Number of queued messages. Diagnostics only, not for flow control.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Remove every queued message, oldest first.
    pub fn drain(&self) -> Vec<Message> {
        self.inner.lock().messages.drain(..).collect()
    }
}

impl MessageSource for LockedMessageQueue {
    fn next_message(&self) -> Option<Message> {
        self.dequeue()
    }
}

impl MessageDestination for LockedMessageQueue {
    fn accept(&self, message: Message) -> Result<(), QueueError> {
        self.enqueue(message)
    }

    fn build_message(&self, raw: Vec<u8>, sender: SocketAddr) -> Result<Message, MessageError> {
        self.kind.build(raw, Address::from(sender))
    }
}
