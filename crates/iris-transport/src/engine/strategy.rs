//! Concurrency strategies
//!
//! A strategy decides how many worker activities an engine runs and how they
//! share the send and receive steps. Every strategy honours the same
//! contract:
//!
//! 1. `launch` starts the workers and returns a [`RunHandle`] over their
//!    cancellation flags
//! 2. once the handle is cancelled, the workers finish their in-flight step,
//!    exit, and the last one out sets the engine state to STOPPED

use super::io::EngineIo;
use super::{SequentialStrategy, ThreadedStrategy};
use crate::activity::RunHandle;
use crate::domain::{EngineState, StatusCell};
use crate::error::EngineResult;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Everything a strategy needs to run one cycle.
#[derive(Clone)]
pub struct LaunchContext {
    /// Shared send/receive steps
    pub io: Arc<EngineIo>,
    /// Engine state; the strategy sets STOPPED when its workers are done
    pub status: Arc<StatusCell<EngineState>>,
    /// Pause taken by a worker that found nothing to send
    pub idle_backoff: Duration,
}

impl fmt::Debug for LaunchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchContext")
            .field("status", &self.status.get())
            .field("idle_backoff", &self.idle_backoff)
            .finish_non_exhaustive()
    }
}

/// How an engine schedules its send and receive work.
pub trait ConcurrencyStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Start the worker activities for one run cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`](crate::EngineError::Spawn) if a worker
    /// could not be started; no worker is left running in that case.
    fn launch(&self, ctx: LaunchContext) -> EngineResult<RunHandle>;
}

/// Built-in strategies, selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// One loop alternating send and receive
    Sequential,
    /// Dedicated send and receive workers under a supervisor
    #[default]
    Threaded,
}

impl StrategyKind {
    /// Instantiate the strategy.
    pub fn build(self) -> Box<dyn ConcurrencyStrategy> {
        match self {
            Self::Sequential => Box::new(SequentialStrategy),
            Self::Threaded => Box::new(ThreadedStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Threaded => write!(f, "threaded"),
        }
    }
}
