//! Lifecycle state machines
//!
//! The engine and the façade share one state machine; the translator uses a
//! smaller one without a terminal state.
//!
//! ```text
//! [CREATED] ──start──→ [RUNNING] ──stop──→ [STOPPED]
//!     │                    ↑                  │  │
//!     │                    └──────start───────┘  │
//!     │                                          │
//!     └──────shutdown──────→ [SHUTDOWN] ←──shutdown
//! ```

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::time::{Duration, Instant};

/// Engine (and façade) lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Constructed, never started
    #[default]
    Created,
    /// Worker activities are running
    Running,
    /// Workers have ceased; can be restarted
    Stopped,
    /// Endpoints released; terminal
    Shutdown,
}

impl EngineState {
    /// `start()` is legal from CREATED and STOPPED.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Created | Self::Stopped)
    }

    /// `stop()` is legal only from RUNNING.
    pub fn can_stop(self) -> bool {
        self == Self::Running
    }

    /// `shutdown()` is legal from CREATED and STOPPED without stopping first.
    pub fn can_shutdown(self) -> bool {
        matches!(self, Self::Created | Self::Stopped)
    }

    /// SHUTDOWN admits no further transitions.
    pub fn is_terminal(self) -> bool {
        self == Self::Shutdown
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Shutdown => write!(f, "SHUTDOWN"),
        }
    }
}

/// Translator lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TranslatorState {
    /// Constructed, never started
    #[default]
    Created,
    /// Translation loop is running
    Running,
    /// Loop has ceased; can be restarted
    Stopped,
}

impl TranslatorState {
    /// `start()` is legal from CREATED and STOPPED.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Created | Self::Stopped)
    }

    /// `stop()` is legal only from RUNNING.
    pub fn can_stop(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for TranslatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Lifecycle state shared between a controller and the workers it launched.
///
/// Workers flip the state when they observe a stop request; the controller
/// waits for that flip with a bounded timeout.
#[derive(Debug, Default)]
pub struct StatusCell<S> {
    state: Mutex<S>,
    changed: Condvar,
}

impl<S: Copy + PartialEq> StatusCell<S> {
    /// Create a cell holding `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            state: Mutex::new(initial),
            changed: Condvar::new(),
        }
    }

    /// Current state.
    pub fn get(&self) -> S {
        *self.state.lock()
    }

    /// Replace the state, waking waiters. Returns the previous state.
    pub fn set(&self, next: S) -> S {
        let mut state = self.state.lock();
        let previous = std::mem::replace(&mut *state, next);
        self.changed.notify_all();
        previous
    }

    /// Block until the state equals `target` or `timeout` elapses.
    ///
    /// Returns whether `target` was reached.
    pub fn wait_for(&self, target: S, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state != target {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return *state == target;
            }
        }
        true
    }
}
