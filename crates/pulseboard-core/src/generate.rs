#![forbid(unsafe_code)]

//! Random-walk dataset and realtime point generation.
//!
//! The simulated stream is intentionally randomized; nothing here promises
//! replayability. Callers pass "now" explicitly so bulk generation lands in
//! a known time window.

use rand::Rng;

use crate::point::Point;

/// Tag for logical series `n`: `"s0"`, `"s1"`, ...
#[must_use]
pub fn series_tag(n: usize) -> String {
    format!("s{n}")
}

/// Generate `count` points per series as a simple random walk.
///
/// Ids are `series_index * count + i`; `x` is the per-series sample index
/// and `timestamp` is the supplied "now" for every point. This is the seed
/// boundary's dataset shape.
#[must_use]
pub fn generate_dataset(count: usize, series: usize, now_ms: u64) -> Vec<Point> {
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(count * series);
    for s in 0..series {
        let tag = series_tag(s);
        let mut y: f64 = rng.gen_range(0.0..100.0);
        for i in 0..count {
            y += rng.gen_range(-1.0..1.0);
            out.push(Point {
                id: (s * count + i) as u64,
                x: i as f64,
                y,
                series: Some(tag.clone()),
                value: Some(y),
                timestamp: Some(now_ms),
            });
        }
    }
    out
}

/// Generate the initial paint dataset: `points_per_series` samples per
/// series spread evenly over the trailing 50 seconds, random walk clamped
/// to 0..=100 so it sits inside the default value filter.
#[must_use]
pub fn initial_dataset(points_per_series: usize, series: usize, now_ms: u64) -> Vec<Point> {
    const TIME_SPREAD_MS: f64 = 50_000.0;

    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(points_per_series * series);
    for s in 0..series {
        let tag = series_tag(s);
        let mut y: f64 = rng.gen_range(50.0..70.0);
        for i in 0..points_per_series {
            let fraction = i as f64 / points_per_series as f64;
            let timestamp = now_ms as f64 - TIME_SPREAD_MS + fraction * TIME_SPREAD_MS;
            y += rng.gen_range(-2.5..2.5);
            y = y.clamp(0.0, 100.0);
            out.push(Point {
                id: (s * points_per_series + i) as u64,
                x: timestamp,
                y,
                series: Some(tag.clone()),
                value: Some(y),
                timestamp: Some(timestamp as u64),
            });
        }
    }
    out
}

/// Bulk-backfill batch for the load-test path: `count` points distributed
/// round-robin across series, timestamps offset one millisecond apart from
/// `now_ms` so they remain individually addressable in the time window.
#[must_use]
pub fn burst_backfill(count: usize, series: usize, start_id: u64, now_ms: u64) -> Vec<Point> {
    let series = series.max(1);
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let ts = now_ms + i as u64;
            let y = rng.gen_range(0.0..100.0);
            Point {
                id: start_id + i as u64,
                x: ts as f64,
                y,
                series: Some(series_tag(i % series)),
                value: Some(y),
                timestamp: Some(ts),
            }
        })
        .collect()
}

/// One untagged realtime sample at "now".
#[must_use]
pub fn realtime_point(id: u64, now_ms: u64) -> Point {
    let y = rand::thread_rng().gen_range(0.0..100.0);
    Point::at(id, now_ms as f64, y, now_ms)
}
