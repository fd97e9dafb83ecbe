#![forbid(unsafe_code)]

//! Window/filter resolution: which points are visible right now.
//!
//! The visible slice is derived from the ring buffer on every recompute and
//! fully replaces the previous one; the buffer itself is never mutated here.
//!
//! # Boundary scan
//!
//! Window edges are located by a reverse two-phase scan from the tail: walk
//! backward past points newer than the window end, then keep walking while
//! points are inside the window. The buffer is append-heavy and the common
//! window ends near the tail, so the scan is near O(1) amortized. A strict
//! binary search would be wrong here: cross-series interleaving within a
//! tick means global timestamp order is only approximate, and the tolerant
//! scan absorbs that.
//!
//! # Variants
//!
//! [`compute_visible`] is the synchronous path used for immediate feedback
//! on filter and range changes. [`compute_visible_aggregated`] is the
//! periodic refresh path; it produces the identical slice and additionally
//! buckets it when aggregation is on and the slice is large enough to be
//! worth it.

use pulseboard_core::controls::AggregationLevel;
use pulseboard_core::{ControlState, Point, RingBuffer, SliceFilters};

use crate::aggregate::{AGGREGATION_THRESHOLD, Aggregator};

/// Compute the currently visible slice: time window, then series filter,
/// then inclusive value-range filter.
///
/// Deterministic: the same buffer, controls and `now_ms` always produce the
/// same slice. An empty buffer short-circuits to an empty slice with no
/// scan.
#[must_use]
pub fn compute_visible(buffer: &RingBuffer, controls: &ControlState, now_ms: u64) -> Vec<Point> {
    if buffer.is_empty() {
        return Vec::new();
    }

    let offset_ms = (controls.offset_secs * 1_000.0).max(0.0) as u64;
    let end_ts = now_ms.saturating_sub(offset_ms);
    let start_ts = controls.range.window_ms().map(|w| end_ts.saturating_sub(w));

    // Phase one: skip points newer than the window end.
    let mut i = buffer.len() as i64 - 1;
    while i >= 0 {
        match buffer.get(i as usize) {
            Some(p) if p.resolver_ts() > end_ts => i -= 1,
            _ => break,
        }
    }
    let end_idx = i;

    // Phase two: walk back through the window to its start.
    match start_ts {
        Some(start_ts) => {
            while i >= 0 {
                match buffer.get(i as usize) {
                    Some(p) if p.resolver_ts() >= start_ts => i -= 1,
                    _ => break,
                }
            }
        }
        None => i = -1, // unbounded window reaches the head
    }
    let start_idx = i + 1;

    if end_idx < start_idx {
        return Vec::new();
    }

    let windowed = (start_idx as usize..=end_idx as usize).filter_map(|idx| buffer.get(idx));
    filter_points(windowed, &controls.filters)
}

/// The periodic-refresh variant: same slice as [`compute_visible`], bucketed
/// through `aggregator` when aggregation is requested and the slice exceeds
/// [`AGGREGATION_THRESHOLD`]. Below that size aggregation cost is not
/// justified and the slice passes through untouched.
#[must_use]
pub fn compute_visible_aggregated(
    buffer: &RingBuffer,
    controls: &ControlState,
    now_ms: u64,
    aggregator: &mut dyn Aggregator,
) -> Vec<Point> {
    let slice = compute_visible(buffer, controls, now_ms);
    if controls.aggregation == AggregationLevel::Raw || slice.len() <= AGGREGATION_THRESHOLD {
        return slice;
    }
    aggregator.aggregate(slice, controls.aggregation, now_ms)
}

/// Apply the series and value-range filters to an already-windowed slice.
///
/// Idempotent: filtering a filtered slice with the same filters is a no-op.
/// An inverted range (`min > max`) matches nothing, by design.
#[must_use]
pub fn apply_filters(slice: &[Point], filters: &SliceFilters) -> Vec<Point> {
    filter_points(slice.iter(), filters)
}

fn filter_points<'a>(
    points: impl Iterator<Item = &'a Point>,
    filters: &SliceFilters,
) -> Vec<Point> {
    points
        .filter(|p| filters.series.matches(p.series.as_deref()))
        .filter(|p| {
            let v = p.filter_value();
            v >= filters.min && v <= filters.max
        })
        .cloned()
        .collect()
}
