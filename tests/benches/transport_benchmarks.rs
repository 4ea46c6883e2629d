//! # Iris Transport Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | Queue | enqueue + dequeue under the internal mutex |
//! | Translator | one pass over encode/decode operations |
//! | Message | inbound construction from raw datagram bytes |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use iris_transport::{Address, LockedMessageQueue, Message, MessageKind, Translator};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

fn address() -> Address {
    Address::new("127.0.0.1", 9999).expect("valid address")
}

fn random_text(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

// ============================================================================
// Queue
// ============================================================================

fn bench_queue_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");
    group.measurement_time(Duration::from_secs(5));

    for batch in [100usize, 1_000, 10_000] {
        let messages: Vec<Message> = (0..batch)
            .map(|_| Message::text(random_text(32), address()).expect("non-empty"))
            .collect();

        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(
            BenchmarkId::new("enqueue_dequeue", batch),
            &messages,
            |b, messages| {
                let queue = LockedMessageQueue::new(MessageKind::Text);
                b.iter(|| {
                    for message in messages {
                        queue.enqueue(message.clone()).expect("kind matches");
                    }
                    while let Some(message) = queue.dequeue() {
                        black_box(message);
                    }
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Translator
// ============================================================================

fn bench_translator_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("translator");

    let plain = Arc::new(LockedMessageQueue::new(MessageKind::Text));
    let wire = Arc::new(LockedMessageQueue::new(MessageKind::Binary));
    let decoded = Arc::new(LockedMessageQueue::new(MessageKind::Text));

    let translator: Translator<&str> = Translator::default();
    translator
        .register_operation(plain.clone(), wire.clone(), Message::to_binary, "encode")
        .expect("fresh key");
    translator
        .register_operation(wire.clone(), decoded.clone(), Message::from_binary, "decode")
        .expect("fresh key");

    for size in [16usize, 512, 1_400] {
        let payload = random_text(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encode_decode", size), &payload, |b, payload| {
            b.iter(|| {
                plain
                    .enqueue(Message::text(payload.clone(), address()).expect("non-empty"))
                    .expect("kind matches");
                black_box(translator.run_pass());
                black_box(translator.run_pass());
                black_box(decoded.dequeue())
            })
        });
    }

    group.bench_function("idle_pass", |b| b.iter(|| black_box(translator.run_pass())));
    group.finish();
}

// ============================================================================
// Inbound message construction
// ============================================================================

fn bench_build_inbound(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound");
    let sender: SocketAddr = "10.0.0.1:5000".parse().expect("literal");
    let raw = random_text(1_024).into_bytes();

    for kind in [MessageKind::Binary, MessageKind::Text] {
        group.bench_with_input(BenchmarkId::new("build", kind), &raw, |b, raw| {
            b.iter(|| black_box(kind.build(raw.clone(), Address::from(sender))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_queue_throughput,
    bench_translator_pass,
    bench_build_inbound
);
criterion_main!(benches);
