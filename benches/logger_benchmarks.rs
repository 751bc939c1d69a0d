//! Criterion benchmarks for rust_async_logger

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_async_logger::core::sink::sink_fn;
use rust_async_logger::prelude::*;
use serde_json::json;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build runtime")
}

fn null_buffer(runtime: &Runtime, config: AsyncConfig) -> AsyncLogBuffer {
    let _guard = runtime.enter();
    AsyncLogBuffer::with_sink(config, sink_fn("null", |_: &StructuredLogEntry| Ok(())))
        .expect("failed to create buffer")
}

fn request_payload(fields: usize) -> Value {
    let mut object = Object::new();
    for i in 0..fields {
        object.insert(format!("field_{}", i), format!("value-{}", i));
    }
    object.insert("status", 200);
    object.insert("latency_ms", 12.5);
    Value::from(object)
}

fn nested_payload(depth: usize) -> Value {
    let mut value = Value::from("leaf");
    for level in 0..depth {
        value = Value::from(Object::new().with("child", value).with("level", level));
    }
    value
}

// ============================================================================
// Buffer Logging Benchmarks
// ============================================================================

fn bench_buffer_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_logging");
    group.throughput(Throughput::Elements(1));

    let rt = runtime();
    let buffer = null_buffer(
        &rt,
        AsyncConfig {
            flush_interval_ms: 10,
            ..AsyncConfig::default()
        },
    );

    group.bench_function("fast_path_info", |b| {
        b.to_async(&rt)
            .iter(|| async { buffer.info(black_box("request handled")).await.unwrap() });
    });

    group.bench_function("main_queue_with_data", |b| {
        b.to_async(&rt).iter(|| async {
            let entry = StructuredLogEntry::new(LogLevel::Info, "request handled")
                .with_data(json!({"status": 200, "path": "/api/users"}));
            buffer.log(black_box(entry)).await.unwrap()
        });
    });

    group.bench_function("builder_with_payload", |b| {
        b.to_async(&rt).iter(|| async {
            StructuredLogBuilder::info()
                .message("request handled")
                .data(request_payload(4))
                .field("request_id", "req-1")
                .log_to(&buffer)
                .await
                .unwrap()
        });
    });

    group.bench_function("sync_mode", |b| {
        buffer.enable_sync_mode();
        b.to_async(&rt)
            .iter(|| async { buffer.warn(black_box("direct write")).await.unwrap() });
        buffer.disable_sync_mode();
    });

    group.finish();
    rt.block_on(buffer.destroy());
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");
    let rt = runtime();

    for batch in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(batch as u64));
        let buffer = null_buffer(
            &rt,
            AsyncConfig {
                flush_interval_ms: 60_000,
                ..AsyncConfig::default()
            },
        );

        group.bench_with_input(BenchmarkId::new("entries", batch), &batch, |b, &batch| {
            b.to_async(&rt).iter(|| async {
                for i in 0..batch {
                    let entry = StructuredLogEntry::new(LogLevel::Debug, "batched")
                        .with_data(json!({ "seq": i }));
                    buffer.log(entry).await.unwrap();
                }
                black_box(buffer.flush().await.unwrap())
            });
        });

        rt.block_on(buffer.destroy());
    }

    group.finish();
}

// ============================================================================
// Serializer Benchmarks
// ============================================================================

fn bench_serializer(c: &mut Criterion) {
    let mut group = c.benchmark_group("serializer");
    group.throughput(Throughput::Elements(1));

    let serializer = SafeSerializer::default();
    let flat = request_payload(8);
    let nested = nested_payload(8);
    let too_deep = nested_payload(50);
    let long_string = Value::from("x".repeat(50_000));

    group.bench_function("flat_object_fast_path", |b| {
        b.iter(|| serializer.serialize(black_box(&flat)).unwrap());
    });

    group.bench_function("nested_object", |b| {
        b.iter(|| serializer.serialize(black_box(&nested)).unwrap());
    });

    group.bench_function("depth_limited", |b| {
        b.iter(|| serializer.serialize(black_box(&too_deep)).unwrap());
    });

    group.bench_function("truncated_string", |b| {
        b.iter(|| serializer.serialize(black_box(&long_string)).unwrap());
    });

    let lossy = SafeSerializer::lossy();
    let node = SharedValue::new(Value::object());
    node.update(|v| v.insert("self", node.clone()));
    node.update(|v| v.insert("name", "cycle"));
    let cyclic = Value::from(node.clone());

    group.bench_function("circular_replaced", |b| {
        b.iter(|| lossy.serialize(black_box(&cyclic)).unwrap());
    });

    group.finish();
    node.set(Value::Null);
}

fn bench_entry_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("entry_rendering");
    group.throughput(Throughput::Elements(1));

    let entry = StructuredLogBuilder::error()
        .message("payment declined")
        .data(request_payload(4))
        .field("user_id", 12345)
        .build()
        .unwrap();
    let console = ConsoleSink::with_colors(false);

    group.bench_function("to_json", |b| {
        b.iter(|| black_box(&entry).to_json().unwrap());
    });

    group.bench_function("console_text", |b| {
        b.iter(|| console.render(black_box(&entry)));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_buffer_logging,
    bench_flush,
    bench_serializer,
    bench_entry_rendering
);

criterion_main!(benches);
