//! # Iris Service
//!
//! Façade wiring one endpoint, four queues, a translator and an engine into a
//! send/receive API.
//!
//! ```text
//! send_message → outbound (TEXT) → encode → outbound (BINARY) → engine → network
//! receive_message ← inbound (TEXT) ← decode ← inbound (BINARY) ← engine ← network
//! ```

use crate::adapters::UdpEndpoint;
use crate::config::IrisConfig;
use crate::domain::{
    is_valid_address, Address, EngineState, Message, MessageKind, Payload, TranslatorState,
};
use crate::engine::Engine;
use crate::error::{EngineError, IrisError, NetworkError, TranslatorError};
use crate::ports::NetworkEndpoint;
use crate::queue::LockedMessageQueue;
use crate::translator::Translator;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Translator key of the TEXT → BINARY operation.
pub const ENCODE_OPERATION: &str = "encode";

/// Translator key of the BINARY → TEXT operation.
pub const DECODE_OPERATION: &str = "decode";

/// Datagram message transmitter.
#[derive(Debug)]
pub struct Iris {
    outbound: Arc<LockedMessageQueue>,
    inbound: Arc<LockedMessageQueue>,
    translator: Translator<&'static str>,
    engine: Engine,
    state: EngineState,
}

impl Iris {
    /// Bind a UDP endpoint on `host:port` and assemble the pipeline.
    ///
    /// # Errors
    ///
    /// - [`IrisError::Config`] if `config` does not validate
    /// - [`IrisError::Binding`] if the address is invalid or already in use
    pub fn bind(host: &str, port: u16, config: IrisConfig) -> Result<Self, IrisError> {
        config.validate()?;
        // Port 0 asks the OS for a free port.
        let check_port = if port == 0 { 1 } else { port };
        if !is_valid_address(host, check_port) {
            return Err(IrisError::Binding(format!("invalid address {host}:{port}")));
        }
        let endpoint = UdpEndpoint::bind((host, port))
            .map_err(|e| IrisError::Binding(format!("{host}:{port}: {e}")))?;
        Self::with_endpoint(Arc::new(endpoint), config)
    }

    /// Bind a UDP endpoint on an OS-assigned port on all interfaces.
    pub fn ephemeral(config: IrisConfig) -> Result<Self, IrisError> {
        Self::bind("0.0.0.0", 0, config)
    }

    /// Assemble the pipeline around an existing endpoint.
    ///
    /// # Errors
    ///
    /// - [`IrisError::Config`] if `config` does not validate
    /// - [`IrisError::Engine`] if the endpoint is rejected by the engine
    pub fn with_endpoint(
        endpoint: Arc<dyn NetworkEndpoint>,
        config: IrisConfig,
    ) -> Result<Self, IrisError> {
        config.validate()?;

        let outbound = Arc::new(LockedMessageQueue::new(MessageKind::Text));
        let outbound_wire = Arc::new(LockedMessageQueue::new(MessageKind::Binary));
        let inbound_wire = Arc::new(LockedMessageQueue::new(MessageKind::Binary));
        let inbound = Arc::new(LockedMessageQueue::new(MessageKind::Text));

        let translator = Translator::with_config(config.translator.clone());
        translator.register_operation(
            outbound.clone(),
            outbound_wire.clone(),
            Message::to_binary,
            ENCODE_OPERATION,
        )?;
        translator.register_operation(
            inbound_wire.clone(),
            inbound.clone(),
            Message::from_binary,
            DECODE_OPERATION,
        )?;

        let engine = Engine::builder(endpoint, inbound_wire, outbound_wire)
            .config(config.engine.clone())
            .build()
            .map_err(EngineError::from)?;

        if let Ok(addr) = engine.local_addr() {
            info!(local = %addr, strategy = engine.strategy_name(), "[iris] Endpoint ready");
        }

        Ok(Self {
            outbound,
            inbound,
            translator,
            engine,
            state: EngineState::Created,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Address the endpoint is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.engine.local_addr()
    }

    /// Queue `payload` for delivery to `host:port`.
    ///
    /// Returns once the message is queued; delivery happens on the engine's
    /// workers and a failure there is only logged.
    ///
    /// # Errors
    ///
    /// - [`IrisError::Sending`] for an invalid address or empty payload
    /// - [`IrisError::Lifecycle`] after shutdown
    pub fn send_message(&self, payload: &str, host: &str, port: u16) -> Result<(), IrisError> {
        if self.state.is_terminal() {
            return Err(IrisError::Lifecycle {
                action: "send",
                state: self.state,
            });
        }
        if !is_valid_address(host, port) {
            return Err(IrisError::Sending(format!("invalid address {host}:{port}")));
        }

        let address = Address::new(host, port).map_err(|e| IrisError::Sending(e.to_string()))?;
        let message =
            Message::text(payload, address).map_err(|e| IrisError::Sending(e.to_string()))?;
        self.outbound.enqueue(message)?;
        Ok(())
    }

    /// Take the oldest received payload and its sender, if any. Never blocks.
    pub fn receive_message(&self) -> Option<(Payload, Address)> {
        self.inbound.dequeue().map(Message::into_parts)
    }

    /// Start the engine, then the translator.
    ///
    /// # Errors
    ///
    /// Returns [`IrisError::Lifecycle`] unless CREATED or STOPPED, or the
    /// underlying start failure. A translator failure stops the engine again.
    pub fn start(&mut self) -> Result<(), IrisError> {
        if !self.state.can_start() {
            return Err(IrisError::Lifecycle {
                action: "start",
                state: self.state,
            });
        }

        self.engine.start()?;
        if let Err(e) = self.translator.start() {
            if let Err(stop) = self.engine.stop() {
                warn!(error = %stop, "[iris] Failed to roll back engine start");
            }
            return Err(e.into());
        }

        self.state = EngineState::Running;
        info!("[iris] Started");
        Ok(())
    }

    /// Stop the engine, then the translator.
    ///
    /// # Errors
    ///
    /// Returns [`IrisError::Lifecycle`] unless RUNNING, or the first stop
    /// failure. After a [`EngineError::StopTimeout`] the call can be retried.
    pub fn stop(&mut self) -> Result<(), IrisError> {
        if !self.state.can_stop() {
            return Err(IrisError::Lifecycle {
                action: "stop",
                state: self.state,
            });
        }

        // A component already STOPPED after an earlier timed-out stop is fine.
        match self.engine.stop() {
            Ok(()) | Err(EngineError::Stop(EngineState::Stopped)) => {}
            Err(e) => return Err(e.into()),
        }
        match self.translator.stop() {
            Ok(()) | Err(TranslatorError::Stop(TranslatorState::Stopped)) => {}
            Err(e) => return Err(e.into()),
        }
        self.state = EngineState::Stopped;
        info!("[iris] Stopped");
        Ok(())
    }

    /// Stop if running, then release the endpoint. Terminal.
    pub fn shutdown(&mut self) -> Result<(), IrisError> {
        if self.state.is_terminal() {
            return Err(IrisError::Lifecycle {
                action: "shutdown",
                state: self.state,
            });
        }
        if self.state.can_stop() {
            self.stop()?;
        }

        self.engine.shutdown()?;
        self.state = EngineState::Shutdown;
        info!("[iris] Shut down");
        Ok(())
    }
}
