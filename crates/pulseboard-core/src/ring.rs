#![forbid(unsafe_code)]

//! Capacity-bounded point store: append at the tail, evict from the head.
//!
//! The buffer is append-only in steady state. After every mutation, if the
//! length exceeds the configured capacity, the oldest points are dropped
//! from the front. Eviction is O(dropped), amortized O(1) per insert.
//!
//! Two capacities are in play: [`LIVE_CAPACITY`] bounds the normal stream,
//! [`BURST_CAPACITY`] bounds load-test/backfill scenarios. Memory stays
//! bounded regardless of how long the stream runs.
//!
//! # Failure Modes
//!
//! None observable: the buffer never errors, and reads from an empty buffer
//! yield empty slices.
//!
//! # Ordering
//!
//! Points arrive in non-decreasing timestamp order per producer tick, but
//! concurrent per-series generation can interleave within a tick, so global
//! timestamp monotonicity across the whole buffer is only approximate.
//! Consumers that locate window edges must use a tolerant scan, not a strict
//! binary search.

use std::collections::VecDeque;

use crate::point::Point;
use crate::time::unix_now_ms;

/// Hard cap for the normal live stream.
pub const LIVE_CAPACITY: usize = 20_000;

/// Hard cap for burst/backfill (load-test) scenarios.
pub const BURST_CAPACITY: usize = 200_000;

/// Append-heavy bounded buffer of telemetry points.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    points: VecDeque<Point>,
    capacity: usize,
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new(LIVE_CAPACITY)
    }
}

impl RingBuffer {
    /// Create an empty buffer with the given hard capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity.min(LIVE_CAPACITY)),
            capacity,
        }
    }

    /// Current hard capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the hard capacity, truncating immediately if the buffer
    /// already exceeds the new cap. Used when switching between live and
    /// burst ingestion modes.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict_overflow();
    }

    /// Number of retained points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the buffer holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index into the retained sequence, oldest first.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Iterate the retained sequence, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// The id of the most recently appended point, if any. Producers use
    /// this to continue the id sequence after a bulk load.
    #[must_use]
    pub fn last_id(&self) -> Option<u64> {
        self.points.back().map(|p| p.id)
    }

    /// Append one point at the tail, backfilling a missing timestamp from
    /// the wall clock. Evicts from the head if the capacity is exceeded.
    pub fn append(&mut self, mut point: Point) {
        if point.timestamp.is_none() {
            point.timestamp = Some(unix_now_ms());
        }
        self.points.push_back(point);
        self.evict_overflow();
    }

    /// Append a batch in order. Timestamps are backfilled per point; a
    /// single eviction pass runs after the whole batch is in.
    pub fn append_batch(&mut self, batch: impl IntoIterator<Item = Point>) {
        let now = unix_now_ms();
        for mut point in batch {
            if point.timestamp.is_none() {
                point.timestamp = Some(now);
            }
            self.points.push_back(point);
        }
        self.evict_overflow();
    }

    /// Replace the entire contents with a bulk-loaded dataset (seed
    /// boundary). The new contents are subject to the same capacity.
    pub fn replace(&mut self, batch: impl IntoIterator<Item = Point>) {
        self.points.clear();
        self.append_batch(batch);
    }

    fn evict_overflow(&mut self) {
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(id: u64) -> Point {
        Point::at(id, id as f64, 0.0, 1_000 + id)
    }

    #[test]
    fn empty_buffer_reads_empty() {
        let buf = RingBuffer::new(4);
        assert!(buf.is_empty());
        assert_eq!(buf.iter().count(), 0);
        assert_eq!(buf.last_id(), None);
    }

    #[test]
    fn append_evicts_from_head() {
        let mut buf = RingBuffer::new(3);
        for id in 0..5 {
            buf.append(pt(id));
        }
        assert_eq!(buf.len(), 3);
        let ids: Vec<u64> = buf.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn batch_evicts_once_after_insert() {
        let mut buf = RingBuffer::new(4);
        buf.append_batch((0..10).map(pt));
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.get(0).map(|p| p.id), Some(6));
    }

    #[test]
    fn missing_timestamp_is_backfilled() {
        let mut buf = RingBuffer::new(4);
        buf.append(Point {
            timestamp: None,
            ..Point::at(1, 0.0, 0.0, 0)
        });
        let ts = buf.get(0).and_then(|p| p.timestamp);
        assert!(ts.is_some());
        assert!(ts.unwrap() > 0);
    }

    #[test]
    fn shrinking_capacity_truncates_immediately() {
        let mut buf = RingBuffer::new(10);
        buf.append_batch((0..10).map(pt));
        buf.set_capacity(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.get(0).map(|p| p.id), Some(6));
    }

    #[test]
    fn replace_swaps_contents() {
        let mut buf = RingBuffer::new(100);
        buf.append_batch((0..10).map(pt));
        buf.replace((100..103).map(pt));
        let ids: Vec<u64> = buf.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![100, 101, 102]);
    }
}
