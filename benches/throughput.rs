//! Throughput Benchmark for ttlkv
//!
//! This benchmark measures the decoder, the store and the full
//! decode → dispatch → encode path under a few workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::time::Duration;
use tokio::time::Instant;
use ttlkv::commands::dispatch;
use ttlkv::protocol::{encode_request, FrameDecoder};
use ttlkv::storage::{KvStore, TtlStore};

/// Benchmark request decoding
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let small = encode_request(&["SET", "user:101", "Alice"]);
    group.throughput(Throughput::Bytes(small.len() as u64));
    group.bench_function("set_small", |b| {
        let mut decoder = FrameDecoder::new();
        b.iter(|| black_box(decoder.decode(&small)));
    });

    let value = "x".repeat(64 * 1024); // 64KB value
    let large = encode_request(&["SET", "blob", value.as_str()]);
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("set_large_split", |b| {
        let mut decoder = FrameDecoder::new();
        b.iter(|| {
            // Delivered in 4KB chunks, as a socket would
            for chunk in large.chunks(4096) {
                black_box(decoder.decode(chunk));
            }
        });
    });

    let mut wide = b"*10000\r\n".to_vec();
    for _ in 0..10_000 {
        wide.extend_from_slice(b"$1\r\na\r\n");
    }
    group.throughput(Throughput::Bytes(wide.len() as u64));
    group.bench_function("many_elements_split", |b| {
        let mut decoder = FrameDecoder::new();
        b.iter(|| {
            for chunk in wide.chunks(4096) {
                black_box(decoder.decode(chunk));
            }
        });
    });

    let mut pipeline = Vec::new();
    for i in 0..100 {
        pipeline.extend(encode_request(&["GET", format!("key:{}", i).as_str()]));
    }
    group.throughput(Throughput::Elements(100));
    group.bench_function("pipeline_100_get", |b| {
        let mut decoder = FrameDecoder::new();
        b.iter(|| black_box(decoder.decode(&pipeline)));
    });

    group.finish();
}

/// Benchmark SET and GET on the store
fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set", |b| {
        let mut store = TtlStore::new();
        let mut i = 0u64;
        b.iter(|| {
            store.set(Bytes::from(format!("key:{}", i)), Bytes::from("value"), None);
            i += 1;
        });
    });

    group.bench_function("set_with_ttl", |b| {
        let mut store = TtlStore::new();
        let mut i = 0u64;
        b.iter(|| {
            store.set(
                Bytes::from(format!("key:{}", i)),
                Bytes::from("value"),
                Some(Duration::from_secs(3600)),
            );
            i += 1;
        });
    });

    let mut store = TtlStore::new();
    for i in 0..100_000 {
        store.set(
            Bytes::from(format!("key:{}", i)),
            Bytes::from(format!("value:{}", i)),
            None,
        );
    }
    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(store.get(key.as_bytes()));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark the per-command sweep, which scans every key
fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    for keys in [1_000, 100_000] {
        let mut store = TtlStore::new();
        for i in 0..keys {
            store.set(
                Bytes::from(format!("key:{}", i)),
                Bytes::from("value"),
                Some(Duration::from_secs(3600)),
            );
        }
        group.bench_function(format!("no_expired_{}", keys), |b| {
            b.iter(|| black_box(store.sweep(Instant::now())));
        });
    }

    group.finish();
}

/// Benchmark decode → dispatch → encode for one request
fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    group.throughput(Throughput::Elements(1));

    let mut store = TtlStore::new();
    let set = encode_request(&["SET", "name", "Alice", "EX", "3600"]);
    let get = encode_request(&["GET", "name"]);

    group.bench_function("set_get", |b| {
        let mut decoder = FrameDecoder::new();
        let mut out = Vec::with_capacity(64);
        b.iter(|| {
            out.clear();
            for request in [&set, &get] {
                for tokens in decoder.decode(request).frames {
                    store.sweep(Instant::now());
                    dispatch(tokens, &mut store).encode_into(&mut out);
                }
            }
            black_box(&out);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_store, bench_sweep, bench_round_trip);

criterion_main!(benches);
