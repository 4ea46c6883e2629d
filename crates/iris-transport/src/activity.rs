//! Worker activities and their cancellation flags
//!
//! Every long-running loop (engine workers, the translator loop) runs on its
//! own OS thread and owns a [`CancellationFlag`] handed to it at spawn time.
//! The controller keeps a [`RunHandle`] holding clones of those flags; the
//! only way to ask a loop to wind down is [`RunHandle::cancel`].

use std::fmt::Display;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, warn};

/// Cooperative run flag owned by one worker activity.
///
/// Raised on creation; lowered once by the controller. Workers check it at
/// every loop-iteration boundary.
#[derive(Clone, Debug)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create a raised flag.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the owning activity should keep running.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Ask the owning activity to stop at its next iteration boundary.
    pub fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for CancellationFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn a named worker thread running `body` until it returns.
///
/// Errors returned by `body` are logged here; they never propagate to the
/// controller.
pub fn spawn_worker<F, E>(name: &str, body: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() -> Result<(), E> + Send + 'static,
    E: Display,
{
    let worker = name.to_string();
    thread::Builder::new().name(name.to_string()).spawn(move || {
        if let Err(e) = body() {
            error!(worker = %worker, error = %e, "Worker exited with error");
        }
    })
}

/// Handle on one run cycle of a set of worker activities.
#[derive(Debug, Default)]
pub struct RunHandle {
    flags: Vec<CancellationFlag>,
    threads: Vec<JoinHandle<()>>,
}

impl RunHandle {
    /// Create a handle over the given flags and threads.
    pub fn new(flags: Vec<CancellationFlag>, threads: Vec<JoinHandle<()>>) -> Self {
        Self { flags, threads }
    }

    /// Lower every flag and wake any parked thread.
    pub fn cancel(&self) {
        for flag in &self.flags {
            flag.cancel();
        }
        for handle in &self.threads {
            handle.thread().unpark();
        }
    }

    /// Whether every thread in this run has exited.
    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(JoinHandle::is_finished)
    }

    /// Wait for every thread in this run to exit.
    pub fn join(self) {
        for handle in self.threads {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            if handle.join().is_err() {
                warn!(worker = %name, "Worker thread panicked");
            }
        }
    }
}
