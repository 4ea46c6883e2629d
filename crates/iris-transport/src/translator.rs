//! # Translator
//!
//! Registry of transform operations between queues, run as its own loop.
//!
//! Each operation is a `(source, destination, transform)` triple stored under a
//! caller-chosen key. One pass visits every operation once, moves at most one
//! message through each, and reports what happened. The loop repeats passes
//! until stopped, idling briefly after a pass that moved nothing.

use crate::activity::{spawn_worker, CancellationFlag, RunHandle};
use crate::config::TranslatorConfig;
use crate::domain::{Message, StatusCell, TranslatorState};
use crate::error::{MessageError, TranslatorError, TranslatorResult};
use crate::ports::{MessageDestination, MessageSource};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

type Transform = Box<dyn Fn(Message) -> Result<Message, MessageError> + Send + Sync>;

struct Operation {
    source: Arc<dyn MessageSource>,
    destination: Arc<dyn MessageDestination>,
    transform: Transform,
}

/// Outcome of one pass over the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Messages transformed and delivered
    pub moved: usize,
    /// Messages taken from a source but dropped
    pub dropped: usize,
}

impl PassReport {
    /// Whether the pass found no work at all.
    pub fn is_idle(&self) -> bool {
        self.moved == 0 && self.dropped == 0
    }
}

/// Runs registered transform operations between queues.
pub struct Translator<K = String>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    operations: Arc<RwLock<HashMap<K, Operation>>>,
    status: Arc<StatusCell<TranslatorState>>,
    run: Option<RunHandle>,
    config: TranslatorConfig,
}

impl<K> Default for Translator<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_config(TranslatorConfig::default())
    }
}

impl<K> Translator<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Create an empty translator in CREATED state.
    pub fn with_config(config: TranslatorConfig) -> Self {
        Self {
            operations: Arc::new(RwLock::new(HashMap::new())),
            status: Arc::new(StatusCell::new(TranslatorState::Created)),
            run: None,
            config,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TranslatorState {
        self.status.get()
    }

    /// Number of registered operations.
    pub fn operation_count(&self) -> usize {
        self.operations.read().len()
    }

    /// Whether an operation is registered under `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.operations.read().contains_key(key)
    }

    /// Register a transform from `source` to `destination` under `key`.
    ///
    /// May be called while running; the new operation is picked up by a
    /// later pass.
    ///
    /// # Errors
    ///
    /// Returns [`TranslatorError::Registration`] if `key` is taken or if
    /// `source` and `destination` are the same object.
    pub fn register_operation<S, D, F>(
        &self,
        source: Arc<S>,
        destination: Arc<D>,
        transform: F,
        key: K,
    ) -> TranslatorResult<()>
    where
        S: MessageSource + 'static,
        D: MessageDestination + 'static,
        F: Fn(Message) -> Result<Message, MessageError> + Send + Sync + 'static,
    {
        if std::ptr::eq(
            Arc::as_ptr(&source) as *const (),
            Arc::as_ptr(&destination) as *const (),
        ) {
            return Err(TranslatorError::Registration {
                key: format!("{key:?}"),
                reason: "source and destination are the same queue".to_string(),
            });
        }

        let mut operations = self.operations.write();
        if operations.contains_key(&key) {
            return Err(TranslatorError::Registration {
                key: format!("{key:?}"),
                reason: "key already registered".to_string(),
            });
        }

        debug!(operation = ?key, "[translator] Operation registered");
        operations.insert(
            key,
            Operation {
                source,
                destination,
                transform: Box::new(transform),
            },
        );
        Ok(())
    }

    /// Remove the operation registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslatorError::Deregistration`] if nothing is registered
    /// under `key`.
    pub fn deregister_operation(&self, key: &K) -> TranslatorResult<()> {
        match self.operations.write().remove(key) {
            Some(_) => {
                debug!(operation = ?key, "[translator] Operation deregistered");
                Ok(())
            }
            None => Err(TranslatorError::Deregistration {
                key: format!("{key:?}"),
            }),
        }
    }

    /// Visit every registered operation once.
    ///
    /// Transform and hand-off failures are logged and the message dropped.
    pub fn run_pass(&self) -> PassReport {
        run_pass(&self.operations)
    }

    /// Start the translation loop.
    ///
    /// # Errors
    ///
    /// - [`TranslatorError::Start`] if already RUNNING
    /// - [`TranslatorError::Spawn`] if the loop thread could not be started
    pub fn start(&mut self) -> TranslatorResult<()> {
        let state = self.status.get();
        if !state.can_start() {
            return Err(TranslatorError::Start(state));
        }

        if let Some(stale) = self.run.take() {
            stale.join();
        }
        self.status.set(TranslatorState::Running);
        let flag = CancellationFlag::new();
        let worker_flag = flag.clone();
        let operations = self.operations.clone();
        let status = self.status.clone();
        let idle_backoff = self.config.idle_backoff();

        let spawned = spawn_worker("iris-translator", move || {
            if !worker_flag.is_running() {
                status.set(TranslatorState::Stopped);
                return Err(TranslatorError::Flag);
            }
            info!("[translator] Loop started");
            while worker_flag.is_running() {
                if run_pass(&operations).is_idle() {
                    thread::sleep(idle_backoff);
                }
            }
            status.set(TranslatorState::Stopped);
            info!("[translator] Loop stopped");
            Ok(())
        });

        match spawned {
            Ok(thread) => {
                self.run = Some(RunHandle::new(vec![flag], vec![thread]));
                Ok(())
            }
            Err(e) => {
                self.status.set(state);
                Err(TranslatorError::Spawn(e))
            }
        }
    }

    /// Stop the translation loop, waiting at most the configured stop timeout.
    ///
    /// # Errors
    ///
    /// - [`TranslatorError::Stop`] unless RUNNING
    /// - [`TranslatorError::StopTimeout`] if the loop did not exit in time
    pub fn stop(&mut self) -> TranslatorResult<()> {
        let state = self.status.get();
        if state == TranslatorState::Stopped {
            if let Some(handle) = self.run.take() {
                // Loop left behind by a timed-out stop has since exited.
                handle.join();
                return Ok(());
            }
        }
        if !state.can_stop() {
            return Err(TranslatorError::Stop(state));
        }

        let Some(handle) = self.run.take() else {
            self.status.set(TranslatorState::Stopped);
            return Ok(());
        };

        handle.cancel();
        let timeout = self.config.stop_timeout();
        if !self.status.wait_for(TranslatorState::Stopped, timeout) {
            warn!(?timeout, "[translator] Loop did not stop in time");
            self.run = Some(handle);
            return Err(TranslatorError::StopTimeout(timeout));
        }
        handle.join();
        Ok(())
    }
}

fn run_pass<K>(operations: &RwLock<HashMap<K, Operation>>) -> PassReport
where
    K: fmt::Debug,
{
    let mut report = PassReport::default();
    let operations = operations.read();

    for (key, op) in operations.iter() {
        let Some(message) = op.source.next_message() else {
            continue;
        };

        let output = match (op.transform)(message) {
            Ok(output) => output,
            Err(e) => {
                warn!(operation = ?key, error = %e, "[translator] Transform failed, message dropped");
                report.dropped += 1;
                continue;
            }
        };

        match op.destination.accept(output) {
            Ok(()) => report.moved += 1,
            Err(e) => {
                warn!(operation = ?key, error = %e, "[translator] Destination rejected message");
                report.dropped += 1;
            }
        }
    }
    report
}

impl<K> Drop for Translator<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Some(handle) = self.run.take() {
            handle.cancel();
        }
    }
}

impl<K> fmt::Debug for Translator<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<K> = self.operations.read().keys().cloned().collect();
        f.debug_struct("Translator")
            .field("state", &self.status.get())
            .field("operations", &keys)
            .finish_non_exhaustive()
    }
}
