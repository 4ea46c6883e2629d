//! # Loopback Flows
//!
//! Message paths exercised against real sockets:
//!
//! 1. **Engine ↔ echo peer**: outbound drains, inbound holds the echoed bytes
//! 2. **Split endpoints**: send socket and listen socket are distinct
//! 3. **Iris ↔ Iris**: two façades exchange text in both directions
//! 4. **Config file → Iris**: TOML settings reach the running pipeline

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use iris_transport::{
        Address, Engine, EngineConfig, EngineState, Iris, IrisConfig, LockedMessageQueue,
        Message, MessageKind, Mode, NetworkEndpoint, StrategyKind, TranslatorConfig,
        UdpEndpoint,
    };

    use crate::support::{init_test_logging, poll_until, EchoPeer};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    const WAIT: Duration = Duration::from_secs(5);

    fn engine_config(strategy: StrategyKind) -> EngineConfig {
        EngineConfig {
            strategy,
            poll_timeout_ms: 2,
            idle_backoff_ms: 1,
            ..EngineConfig::default()
        }
    }

    fn iris_config(strategy: StrategyKind) -> IrisConfig {
        IrisConfig {
            engine: engine_config(strategy),
            translator: TranslatorConfig {
                idle_backoff_ms: 1,
                ..TranslatorConfig::default()
            },
        }
    }

    fn loopback_endpoint() -> Arc<UdpEndpoint> {
        Arc::new(UdpEndpoint::bind("127.0.0.1:0").unwrap())
    }

    // =========================================================================
    // ENGINE FLOWS
    // =========================================================================

    #[test]
    fn test_engine_echo_cycle_over_udp() {
        init_test_logging();
        let peer = EchoPeer::spawn().unwrap();

        for strategy in [StrategyKind::Sequential, StrategyKind::Threaded] {
            let endpoint = loopback_endpoint();
            let inbound = Arc::new(LockedMessageQueue::new(MessageKind::Binary));
            let outbound = Arc::new(LockedMessageQueue::new(MessageKind::Binary));
            let mut engine = Engine::builder(endpoint.clone(), inbound.clone(), outbound.clone())
                .config(engine_config(strategy))
                .build()
                .unwrap();

            outbound
                .enqueue(Message::binary(b"ping".to_vec(), Address::from(peer.addr())).unwrap())
                .unwrap();
            engine.start().unwrap();

            let echoed = poll_until(WAIT, || inbound.dequeue()).expect("no echo received");
            engine.shutdown().unwrap();

            assert!(outbound.is_empty());
            assert_eq!(echoed.mode(), Mode::Binary);
            assert_eq!(echoed.payload().as_bytes(), b"ping");
            assert_eq!(echoed.address(), &Address::from(peer.addr()));
            assert_eq!(engine.state(), EngineState::Shutdown);
            assert!(endpoint.is_closed());
        }
    }

    #[test]
    fn test_engine_with_split_endpoints() {
        init_test_logging();
        let listen = loopback_endpoint();
        let send = loopback_endpoint();
        let listen_addr = listen.local_addr().unwrap();
        let send_addr = send.local_addr().unwrap();

        let inbound = Arc::new(LockedMessageQueue::new(MessageKind::Text));
        let outbound = Arc::new(LockedMessageQueue::new(MessageKind::Text));
        let mut engine = Engine::builder(listen.clone(), inbound.clone(), outbound.clone())
            .send_endpoint(send.clone())
            .config(engine_config(StrategyKind::Threaded))
            .build()
            .unwrap();

        // Sent from one socket, received on the other.
        outbound
            .enqueue(Message::text("loop", Address::from(listen_addr)).unwrap())
            .unwrap();
        engine.start().unwrap();

        let received = poll_until(WAIT, || inbound.dequeue()).expect("nothing received");
        engine.shutdown().unwrap();

        assert_eq!(received.payload().as_text(), Some("loop"));
        assert_eq!(received.address().port(), send_addr.port());
        assert!(listen.is_closed());
        assert!(send.is_closed());
    }

    // =========================================================================
    // FAÇADE FLOWS
    // =========================================================================

    #[test]
    fn test_two_iris_instances_exchange_text() {
        init_test_logging();
        let mut alice = Iris::bind("127.0.0.1", 0, iris_config(StrategyKind::Threaded)).unwrap();
        let mut bob = Iris::bind("127.0.0.1", 0, iris_config(StrategyKind::Sequential)).unwrap();
        let alice_port = alice.local_addr().unwrap().port();
        let bob_port = bob.local_addr().unwrap().port();

        alice.start().unwrap();
        bob.start().unwrap();

        alice.send_message("hello bob", "127.0.0.1", bob_port).unwrap();
        let (payload, sender) = poll_until(WAIT, || bob.receive_message()).expect("bob got nothing");
        assert_eq!(payload.as_text(), Some("hello bob"));
        assert_eq!(sender.port(), alice_port);

        bob.send_message("hi alice", sender.host(), sender.port()).unwrap();
        let (payload, sender) =
            poll_until(WAIT, || alice.receive_message()).expect("alice got nothing");
        assert_eq!(payload.as_text(), Some("hi alice"));
        assert_eq!(sender.port(), bob_port);

        alice.shutdown().unwrap();
        bob.shutdown().unwrap();
    }

    #[test]
    fn test_iris_round_trip_through_echo_peer() {
        init_test_logging();
        let peer = EchoPeer::spawn().unwrap();
        let mut iris = Iris::bind("127.0.0.1", 0, iris_config(StrategyKind::Threaded)).unwrap();
        iris.start().unwrap();

        let target = peer.addr();
        for text in ["one", "two", "three"] {
            iris.send_message(text, "127.0.0.1", target.port()).unwrap();
        }

        let mut received = Vec::new();
        while received.len() < 3 {
            let (payload, _) = poll_until(WAIT, || iris.receive_message()).expect("echo missing");
            received.push(payload.as_text().unwrap().to_string());
        }
        iris.shutdown().unwrap();

        // One operation per direction preserves order end-to-end.
        assert_eq!(received, vec!["one", "two", "three"]);
        assert_eq!(peer.echoed(), 3);
    }

    #[test]
    fn test_iris_from_config_file() {
        init_test_logging();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[engine]\nstrategy = \"sequential\"\npoll_timeout_ms = 2\n\n[translator]\nidle_backoff_ms = 1"
        )
        .unwrap();

        let config = IrisConfig::load(file.path()).unwrap();
        assert_eq!(config.engine.strategy, StrategyKind::Sequential);

        let peer = EchoPeer::spawn().unwrap();
        let mut iris = Iris::bind("127.0.0.1", 0, config).unwrap();
        iris.start().unwrap();
        iris.send_message("configured", "127.0.0.1", peer.addr().port())
            .unwrap();

        let (payload, _) = poll_until(WAIT, || iris.receive_message()).expect("echo missing");
        iris.shutdown().unwrap();
        assert_eq!(payload.as_text(), Some("configured"));
    }
}
