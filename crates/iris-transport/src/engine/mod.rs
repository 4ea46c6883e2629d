//! # Engine
//!
//! Moves messages between the network and the pipeline queues.
//!
//! - **Send step:** take one message from the outbound source, transmit it
//! - **Receive step:** poll for one datagram, build a message, hand it to the
//!   inbound destination
//!
//! How those steps are scheduled is delegated to a [`ConcurrencyStrategy`].
//! The engine itself only owns the lifecycle:
//!
//! ```text
//! [CREATED] ──start──→ [RUNNING] ──stop──→ [STOPPED] ──shutdown──→ [SHUTDOWN]
//! ```

mod io;
mod sequential;
mod strategy;
mod threaded;

pub use io::{EngineIo, ReceiveOutcome, SendOutcome};
pub use sequential::SequentialStrategy;
pub use strategy::{ConcurrencyStrategy, LaunchContext, StrategyKind};
pub use threaded::ThreadedStrategy;

use crate::activity::RunHandle;
use crate::config::EngineConfig;
use crate::domain::{EngineState, StatusCell};
use crate::error::{EngineError, EngineInitError, EngineResult, NetworkError};
use crate::ports::{
    EndpointKind, EndpointRole, MessageDestination, MessageSource, NetworkEndpoint,
};
use io::same_endpoint;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hook run against each endpoint while the engine is built.
pub type EndpointHook =
    Box<dyn Fn(EndpointRole, &dyn NetworkEndpoint) -> Result<(), NetworkError> + Send + Sync>;

/// Network I/O engine.
pub struct Engine {
    io: Arc<EngineIo>,
    strategy: Box<dyn ConcurrencyStrategy>,
    status: Arc<StatusCell<EngineState>>,
    run: Option<RunHandle>,
    config: EngineConfig,
}

impl Engine {
    /// Start building an engine around a listen endpoint and its two queues.
    ///
    /// The listen endpoint also sends unless
    /// [`send_endpoint`](EngineBuilder::send_endpoint) is set.
    pub fn builder(
        listen: Arc<dyn NetworkEndpoint>,
        inbound: Arc<dyn MessageDestination>,
        outbound: Arc<dyn MessageSource>,
    ) -> EngineBuilder {
        EngineBuilder {
            listen,
            send: None,
            inbound,
            outbound,
            strategy: None,
            config: EngineConfig::default(),
            hook: None,
        }
    }

    /// Build a single-socket engine with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`EngineInitError`] if the endpoint is not a datagram endpoint
    /// or cannot be configured.
    pub fn new(
        endpoint: Arc<dyn NetworkEndpoint>,
        inbound: Arc<dyn MessageDestination>,
        outbound: Arc<dyn MessageSource>,
    ) -> Result<Self, EngineInitError> {
        Self::builder(endpoint, inbound, outbound).build()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.status.get()
    }

    /// Name of the concurrency strategy in use.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Address the listen endpoint is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.io.listen_endpoint().local_addr()
    }

    /// Settings this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Launch the worker activities.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Start`] unless the engine is CREATED or STOPPED
    /// - [`EngineError::Spawn`] if a worker could not be started; the engine
    ///   keeps its previous state
    pub fn start(&mut self) -> EngineResult<()> {
        let state = self.status.get();
        if !state.can_start() {
            return Err(EngineError::Start(state));
        }

        self.reap();
        self.status.set(EngineState::Running);
        let ctx = LaunchContext {
            io: self.io.clone(),
            status: self.status.clone(),
            idle_backoff: self.config.idle_backoff(),
        };

        match self.strategy.launch(ctx) {
            Ok(handle) => {
                self.run = Some(handle);
                info!(strategy = self.strategy.name(), "[engine] Started");
                Ok(())
            }
            Err(e) => {
                self.status.set(state);
                Err(e)
            }
        }
    }

    /// Ask the workers to wind down and wait for them.
    ///
    /// The wait is bounded by the configured stop timeout.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Stop`] unless the engine is RUNNING
    /// - [`EngineError::StopTimeout`] if the workers did not finish in time;
    ///   they remain cancelled and the engine stays RUNNING until they exit
    ///
    /// Once workers left behind by a timed-out stop have reported STOPPED, the
    /// next call joins them and succeeds.
    pub fn stop(&mut self) -> EngineResult<()> {
        let state = self.status.get();
        if state == EngineState::Stopped && self.reap() {
            info!("[engine] Stopped after delayed wind-down");
            return Ok(());
        }
        if !state.can_stop() {
            return Err(EngineError::Stop(state));
        }

        let Some(handle) = self.run.take() else {
            // Running without a handle only happens mid-start; treat as stopped.
            self.status.set(EngineState::Stopped);
            return Ok(());
        };

        handle.cancel();
        let timeout = self.config.stop_timeout();
        if !self.status.wait_for(EngineState::Stopped, timeout) {
            warn!(?timeout, "[engine] Workers did not stop in time");
            self.run = Some(handle);
            return Err(EngineError::StopTimeout(timeout));
        }

        handle.join();
        info!("[engine] Stopped");
        Ok(())
    }

    // Join workers retained by a timed-out stop. True if there were any.
    fn reap(&mut self) -> bool {
        match self.run.take() {
            Some(handle) => {
                handle.join();
                true
            }
            None => false,
        }
    }

    /// Release the endpoints. Terminal.
    ///
    /// A running engine is stopped first.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Shutdown`] if already shut down
    /// - any error from the implicit [`stop`](Self::stop)
    pub fn shutdown(&mut self) -> EngineResult<()> {
        let state = self.status.get();
        if state.is_terminal() {
            return Err(EngineError::Shutdown(state));
        }
        if state.can_stop() {
            self.stop()?;
        } else {
            self.reap();
        }

        let listen = self.io.listen_endpoint();
        if let Err(e) = listen.close() {
            warn!(error = %e, "[engine] Failed to close listen endpoint");
        }
        if !self.io.is_single_socket() {
            if let Err(e) = self.io.send_endpoint().close() {
                warn!(error = %e, "[engine] Failed to close send endpoint");
            }
        }

        self.status.set(EngineState::Shutdown);
        info!("[engine] Shut down");
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(handle) = self.run.take() {
            handle.cancel();
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.status.get())
            .field("strategy", &self.strategy.name())
            .field("io", &self.io)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    listen: Arc<dyn NetworkEndpoint>,
    send: Option<Arc<dyn NetworkEndpoint>>,
    inbound: Arc<dyn MessageDestination>,
    outbound: Arc<dyn MessageSource>,
    strategy: Option<Box<dyn ConcurrencyStrategy>>,
    config: EngineConfig,
    hook: Option<EndpointHook>,
}

impl EngineBuilder {
    /// Send through a separate endpoint.
    pub fn send_endpoint(mut self, endpoint: Arc<dyn NetworkEndpoint>) -> Self {
        self.send = Some(endpoint);
        self
    }

    /// Override the strategy named in the config.
    pub fn strategy(mut self, strategy: impl ConcurrencyStrategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    /// Engine settings.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Extra per-endpoint configuration, run once per distinct endpoint.
    pub fn configure<F>(mut self, hook: F) -> Self
    where
        F: Fn(EndpointRole, &dyn NetworkEndpoint) -> Result<(), NetworkError>
            + Send
            + Sync
            + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Validate the endpoints and assemble the engine in CREATED state.
    ///
    /// Endpoint kinds are checked before anything is configured, so a kind
    /// rejection leaves both endpoints untouched. Configuration then runs in
    /// order: listen poll timeout, listen hook, send hook. A failure there
    /// leaves the earlier steps applied.
    ///
    /// # Errors
    ///
    /// - [`EngineInitError::NotDatagram`] if either endpoint is not datagram
    /// - [`EngineInitError::Configure`] if an endpoint rejects configuration
    pub fn build(self) -> Result<Engine, EngineInitError> {
        let send = self.send.unwrap_or_else(|| self.listen.clone());

        for (role, endpoint) in [(EndpointRole::Listen, &self.listen), (EndpointRole::Send, &send)] {
            let kind = endpoint.kind();
            if kind != EndpointKind::Datagram {
                return Err(EngineInitError::NotDatagram { role, kind });
            }
        }

        self.listen
            .set_poll_timeout(self.config.poll_timeout())
            .map_err(|source| EngineInitError::Configure {
                role: EndpointRole::Listen,
                source,
            })?;

        if let Some(hook) = &self.hook {
            hook(EndpointRole::Listen, self.listen.as_ref()).map_err(|source| {
                EngineInitError::Configure {
                    role: EndpointRole::Listen,
                    source,
                }
            })?;
            if !same_endpoint(&self.listen, &send) {
                hook(EndpointRole::Send, send.as_ref()).map_err(|source| {
                    EngineInitError::Configure {
                        role: EndpointRole::Send,
                        source,
                    }
                })?;
            }
        }

        let strategy = self
            .strategy
            .unwrap_or_else(|| self.config.strategy.build());
        debug!(strategy = strategy.name(), "[engine] Built");

        Ok(Engine {
            io: Arc::new(EngineIo::new(
                self.listen,
                send,
                self.inbound,
                self.outbound,
                self.config.max_datagram_size,
            )),
            strategy,
            status: Arc::new(StatusCell::new(EngineState::Created)),
            run: None,
            config: self.config,
        })
    }
}
