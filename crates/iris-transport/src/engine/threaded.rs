//! Dual-activity strategy
//!
//! A send worker and a receive worker run independently, so a slow receive
//! poll never delays outbound traffic. A supervisor thread owns the run: once
//! its flag is lowered it cancels both workers, joins them, and only then
//! marks the engine STOPPED.

use super::io::SendOutcome;
use super::strategy::{ConcurrencyStrategy, LaunchContext};
use crate::activity::{spawn_worker, CancellationFlag, RunHandle};
use crate::domain::EngineState;
use crate::error::{EngineError, EngineResult};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const SUPERVISOR_TICK: Duration = Duration::from_millis(50);

/// Runs send and receive on two worker threads under a supervisor.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadedStrategy;

impl ConcurrencyStrategy for ThreadedStrategy {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn launch(&self, ctx: LaunchContext) -> EngineResult<RunHandle> {
        let send_flag = CancellationFlag::new();
        let recv_flag = CancellationFlag::new();
        let supervisor_flag = CancellationFlag::new();

        let sender = spawn(
            "iris-engine-send",
            send_worker(ctx.clone(), send_flag.clone()),
        )?;

        let receiver = match spawn(
            "iris-engine-recv",
            receive_worker(ctx.clone(), recv_flag.clone()),
        ) {
            Ok(handle) => handle,
            Err(e) => {
                send_flag.cancel();
                RunHandle::new(Vec::new(), vec![sender]).join();
                return Err(e);
            }
        };

        let workers = RunHandle::new(
            vec![send_flag.clone(), recv_flag.clone()],
            vec![sender, receiver],
        );

        let status = ctx.status.clone();
        let watch = supervisor_flag.clone();
        let supervisor = spawn("iris-engine", move || {
            while watch.is_running() {
                thread::park_timeout(SUPERVISOR_TICK);
            }
            workers.cancel();
            workers.join();
            status.set(EngineState::Stopped);
            info!("[engine] Threaded workers stopped");
            Ok(())
        });

        let supervisor = match supervisor {
            Ok(handle) => handle,
            Err(e) => {
                // Workers were moved into the failed closure and dropped
                // without joining; lowering their flags lets them exit.
                send_flag.cancel();
                recv_flag.cancel();
                return Err(e);
            }
        };

        info!("[engine] Threaded workers started");
        Ok(RunHandle::new(
            vec![supervisor_flag, send_flag, recv_flag],
            vec![supervisor],
        ))
    }
}

fn spawn<F>(name: &str, body: F) -> EngineResult<JoinHandle<()>>
where
    F: FnOnce() -> EngineResult<()> + Send + 'static,
{
    spawn_worker(name, body).map_err(|source| EngineError::Spawn {
        name: name.to_string(),
        source,
    })
}

fn send_worker(
    ctx: LaunchContext,
    flag: CancellationFlag,
) -> impl FnOnce() -> EngineResult<()> + Send + 'static {
    move || {
        if !flag.is_running() {
            return Err(EngineError::Flag("send worker cancelled before start".to_string()));
        }
        while flag.is_running() {
            match ctx.io.send_step() {
                Ok(SendOutcome::Sent { bytes }) => debug!(bytes, "[engine] Send step"),
                Ok(SendOutcome::Idle) => thread::sleep(ctx.idle_backoff),
                Err(e) => warn!(error = %e, "[engine] Send step failed"),
            }
        }
        Ok(())
    }
}

fn receive_worker(
    ctx: LaunchContext,
    flag: CancellationFlag,
) -> impl FnOnce() -> EngineResult<()> + Send + 'static {
    move || {
        if !flag.is_running() {
            return Err(EngineError::Flag(
                "receive worker cancelled before start".to_string(),
            ));
        }
        let mut buf = ctx.io.receive_buffer();
        while flag.is_running() {
            if let Err(e) = ctx.io.receive_step(&mut buf) {
                warn!(error = %e, "[engine] Receive step failed");
                thread::sleep(ctx.idle_backoff);
            }
        }
        Ok(())
    }
}
