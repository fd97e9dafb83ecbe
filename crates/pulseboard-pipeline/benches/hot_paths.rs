//! Hot-path benchmarks: window resolution over a full burst-capacity
//! buffer, and bucketing of a large slice.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pulseboard_core::controls::{AggregationLevel, ControlState, TimeRange};
use pulseboard_core::{Point, RingBuffer};
use pulseboard_pipeline::{bucketize, compute_visible};

const NOW: u64 = 2_000_000_000_000;

fn full_buffer(len: usize) -> RingBuffer {
    let mut buf = RingBuffer::new(len);
    buf.append_batch((0..len as u64).map(|i| {
        let ts = NOW - (len as u64 - i) * 10;
        Point::tagged(i, ts as f64, (i % 100) as f64, &format!("s{}", i % 3), ts)
    }));
    buf
}

fn bench_resolver(c: &mut Criterion) {
    let buf = full_buffer(200_000);

    c.bench_function("resolve_all_200k", |b| {
        let controls = ControlState::default();
        b.iter(|| black_box(compute_visible(&buf, &controls, NOW)));
    });

    c.bench_function("resolve_1m_window_200k", |b| {
        let controls = ControlState {
            range: TimeRange::OneMinute,
            ..ControlState::default()
        };
        b.iter(|| black_box(compute_visible(&buf, &controls, NOW)));
    });
}

fn bench_bucketize(c: &mut Criterion) {
    let slice: Vec<Point> = (0..50_000u64)
        .map(|i| {
            let ts = NOW - (50_000 - i) * 10;
            Point::at(i, ts as f64, (i % 100) as f64, ts)
        })
        .collect();

    c.bench_function("bucketize_1min_50k", |b| {
        b.iter(|| black_box(bucketize(&slice, AggregationLevel::OneMinute, NOW)));
    });
}

criterion_group!(benches, bench_resolver, bench_bucketize);
criterion_main!(benches);
