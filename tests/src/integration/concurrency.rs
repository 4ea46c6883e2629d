//! # Concurrency Scenarios
//!
//! Fan-in from many producer threads and restart while traffic is queued.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;
    use std::time::Duration;

    use iris_transport::{
        EngineConfig, EngineState, Iris, IrisConfig, StrategyKind, TranslatorConfig,
    };
    use rand::Rng;

    use crate::support::{init_test_logging, poll_until, EchoPeer};

    const WAIT: Duration = Duration::from_secs(5);

    fn config() -> IrisConfig {
        IrisConfig {
            engine: EngineConfig {
                strategy: StrategyKind::Threaded,
                poll_timeout_ms: 2,
                idle_backoff_ms: 1,
                ..EngineConfig::default()
            },
            translator: TranslatorConfig {
                idle_backoff_ms: 1,
                ..TranslatorConfig::default()
            },
        }
    }

    fn collect(iris: &Iris, expected: usize) -> HashSet<String> {
        let mut seen = HashSet::new();
        while seen.len() < expected {
            let (payload, _) = poll_until(WAIT, || iris.receive_message())
                .unwrap_or_else(|| panic!("only {} of {expected} arrived", seen.len()));
            let text = payload.as_text().unwrap().to_string();
            assert!(seen.insert(text), "duplicate delivery");
        }
        seen
    }

    #[test]
    fn test_concurrent_producers_nothing_lost_or_duplicated() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 25;

        init_test_logging();
        let peer = EchoPeer::spawn().unwrap();
        let port = peer.addr().port();
        let mut iris = Iris::bind("127.0.0.1", 0, config()).unwrap();
        iris.start().unwrap();

        let shared = &iris;
        thread::scope(|scope| {
            for p in 0..PRODUCERS {
                scope.spawn(move || {
                    let mut rng = rand::thread_rng();
                    for i in 0..PER_PRODUCER {
                        let padding = "x".repeat(rng.gen_range(0..64));
                        shared
                            .send_message(&format!("{p}:{i}:{padding}"), "127.0.0.1", port)
                            .unwrap();
                    }
                });
            }
        });

        let seen = collect(&iris, PRODUCERS * PER_PRODUCER);
        iris.shutdown().unwrap();

        for p in 0..PRODUCERS {
            for i in 0..PER_PRODUCER {
                let prefix = format!("{p}:{i}:");
                assert!(seen.iter().any(|s| s.starts_with(&prefix)), "{prefix} missing");
            }
        }
    }

    #[test]
    fn test_messages_queued_while_stopped_flow_after_restart() {
        init_test_logging();
        let peer = EchoPeer::spawn().unwrap();
        let port = peer.addr().port();
        let mut iris = Iris::bind("127.0.0.1", 0, config()).unwrap();

        iris.start().unwrap();
        iris.send_message("before", "127.0.0.1", port).unwrap();
        assert!(collect(&iris, 1).contains("before"));

        iris.stop().unwrap();
        assert_eq!(iris.state(), EngineState::Stopped);
        for i in 0..5 {
            iris.send_message(&format!("queued-{i}"), "127.0.0.1", port)
                .unwrap();
        }
        thread::sleep(Duration::from_millis(20));
        assert!(iris.receive_message().is_none());

        iris.start().unwrap();
        let seen = collect(&iris, 5);
        iris.shutdown().unwrap();
        assert!((0..5).all(|i| seen.contains(&format!("queued-{i}"))));
    }
}
