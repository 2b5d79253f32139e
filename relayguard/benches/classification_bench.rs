//! Benchmarks for failure classification and contract validation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relayguard::classification::{classify, classify_validation_failure, is_transient_connection_error};
use relayguard::contracts::validate_event;
use relayguard::core::{EventKind, StreamEvent};

fn classification_benchmark(c: &mut Criterion) {
    let messages = [
        "401 unauthorized",
        "model gpt-9 does not exist",
        "socket hang up",
        "generic transient glitch with a somewhat longer message body to scan",
    ];

    c.bench_function("classify", |b| {
        b.iter(|| {
            for message in &messages {
                black_box(classify(black_box(message)));
            }
        })
    });

    c.bench_function("classify_validation_failure", |b| {
        b.iter(|| black_box(classify_validation_failure(black_box("Rate limit reached"))))
    });

    c.bench_function("is_transient_connection_error", |b| {
        b.iter(|| black_box(is_transient_connection_error(black_box("read ECONNRESET"))))
    });
}

fn validation_benchmark(c: &mut Criterion) {
    let events = [
        StreamEvent::data("chunk"),
        StreamEvent::terminal_result("corr-1"),
        StreamEvent::new(EventKind::Unknown("telepathy".to_string())),
    ];

    c.bench_function("validate_event", |b| {
        b.iter(|| {
            for event in &events {
                let _ = black_box(validate_event(black_box(event)));
            }
        })
    });
}

criterion_group!(benches, classification_benchmark, validation_benchmark);
criterion_main!(benches);
