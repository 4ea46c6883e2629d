//! Single-activity strategy: one loop alternates a send step and a receive step.

use super::io::{EngineIo, SendOutcome};
use super::strategy::{ConcurrencyStrategy, LaunchContext};
use crate::activity::{spawn_worker, CancellationFlag, RunHandle};
use crate::domain::EngineState;
use crate::error::{EngineError, EngineResult};
use std::thread;
use tracing::{debug, info, warn};

/// Runs send and receive on a single worker thread.
///
/// Each iteration sends at most one outbound message, then polls for at most
/// one inbound datagram. The receive poll timeout bounds how long a pending
/// send can be held up by an idle network.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialStrategy;

impl ConcurrencyStrategy for SequentialStrategy {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn launch(&self, ctx: LaunchContext) -> EngineResult<RunHandle> {
        let flag = CancellationFlag::new();
        let worker_flag = flag.clone();

        let thread = spawn_worker("iris-engine", move || run_loop(&ctx, &worker_flag))
            .map_err(|source| EngineError::Spawn {
                name: "iris-engine".to_string(),
                source,
            })?;

        Ok(RunHandle::new(vec![flag], vec![thread]))
    }
}

fn run_loop(ctx: &LaunchContext, flag: &CancellationFlag) -> EngineResult<()> {
    if !flag.is_running() {
        ctx.status.set(EngineState::Stopped);
        return Err(EngineError::Flag(
            "run flag lowered before the loop started".to_string(),
        ));
    }

    info!("[engine] Sequential loop started");
    let mut buf = ctx.io.receive_buffer();

    while flag.is_running() {
        step(&ctx.io, &mut buf, ctx);
    }

    ctx.status.set(EngineState::Stopped);
    info!("[engine] Sequential loop stopped");
    Ok(())
}

fn step(io: &EngineIo, buf: &mut [u8], ctx: &LaunchContext) {
    match io.send_step() {
        Ok(SendOutcome::Sent { bytes }) => debug!(bytes, "[engine] Send step"),
        Ok(SendOutcome::Idle) => {}
        Err(e) => warn!(error = %e, "[engine] Send step failed"),
    }

    if let Err(e) = io.receive_step(buf) {
        warn!(error = %e, "[engine] Receive step failed");
        // A faulted endpoint returns immediately; avoid spinning on it.
        thread::sleep(ctx.idle_backoff);
    }
}
