//! The inline and offloaded aggregation paths must stay numerically
//! identical: same buckets, same averages, bit for bit.

use proptest::prelude::*;
use pulseboard_core::controls::{AggregationLevel, ControlState};
use pulseboard_core::{Point, RingBuffer};
use pulseboard_pipeline::{
    bucketize, compute_visible_aggregated, InlineAggregator, WorkerAggregator,
};

fn level_strategy() -> impl Strategy<Value = AggregationLevel> {
    prop_oneof![
        Just(AggregationLevel::OneMinute),
        Just(AggregationLevel::FiveMinutes),
        Just(AggregationLevel::OneHour),
    ]
}

fn slice_strategy() -> impl Strategy<Value = Vec<Point>> {
    proptest::collection::vec((0u64..86_400_000, -1_000.0f64..1_000.0), 0..500).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (ts, y))| Point::at(i as u64, ts as f64, y, ts))
            .collect()
    })
}

proptest! {
    #[test]
    fn inline_and_worker_agree_bit_for_bit(
        slice in slice_strategy(),
        level in level_strategy(),
    ) {
        let mut worker = WorkerAggregator::spawn().expect("worker thread");
        let inline = bucketize(&slice, level, 0);
        let offloaded = {
            use pulseboard_pipeline::Aggregator;
            worker.aggregate(slice, level, 0)
        };
        prop_assert_eq!(inline.len(), offloaded.len());
        for (a, b) in inline.iter().zip(offloaded.iter()) {
            prop_assert_eq!(a.id, b.id);
            prop_assert_eq!(a.timestamp, b.timestamp);
            prop_assert!(a.y.to_bits() == b.y.to_bits(), "averages differ in bits");
        }
    }
}

proptest! {
    #[test]
    fn bucket_starts_are_sorted_and_unique(
        slice in slice_strategy(),
        level in level_strategy(),
    ) {
        let out = bucketize(&slice, level, 0);
        for pair in out.windows(2) {
            prop_assert!(pair[0].resolver_ts() < pair[1].resolver_ts());
        }
    }
}

#[test]
fn large_slice_goes_through_the_aggregator() {
    // Above the size threshold the periodic path buckets; the sync slice
    // and the aggregated slice must describe the same data at different
    // resolutions.
    let base = 1_699_999_980_000u64;
    let mut buf = RingBuffer::new(1_000_000);
    buf.append_batch((0..12_000u64).map(|i| {
        let ts = base + i * 50; // 10 minutes of 20Hz data
        Point::at(i, ts as f64, (i % 100) as f64, ts)
    }));

    let controls = ControlState {
        aggregation: AggregationLevel::OneMinute,
        ..ControlState::default()
    };
    let now = base + 12_000 * 50;

    let mut inline = InlineAggregator;
    let out = compute_visible_aggregated(&buf, &controls, now, &mut inline);
    assert_eq!(out.len(), 10); // 10 one-minute buckets
    assert!(out.len() < buf.len());
    for p in &out {
        assert_eq!(p.resolver_ts() % 60_000, 0);
    }
}
