#![forbid(unsafe_code)]

//! The telemetry sample type shared by every pipeline stage.
//!
//! A [`Point`] is deliberately loose: producers differ in what they fill in.
//! The ring buffer backfills a missing `timestamp` on insert, because the
//! window resolver treats `timestamp` as ground truth. Only the aggregation
//! step ever falls back to `x` when a timestamp is absent.

use serde::{Deserialize, Serialize};

/// A single telemetry sample.
///
/// `id` is unique and monotonic per producer. `value` mirrors `y` for
/// generated points and exists so tabular consumers do not need to know
/// which axis carries the measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Unique, monotonically increasing per producer.
    pub id: u64,

    /// Horizontal coordinate. Realtime producers set this to the epoch-ms
    /// timestamp; bulk generators may use an index instead.
    pub x: f64,

    /// Vertical coordinate (the measurement).
    pub y: f64,

    /// Logical series tag (`"s0"`, `"s1"`, ...). Absent for untagged points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,

    /// Alias of `y` carried for tabular consumers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// Epoch milliseconds. Required by the resolver; the ring buffer
    /// backfills it before insertion when a producer omits it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Point {
    /// Build a minimal untagged point with an explicit timestamp.
    #[must_use]
    pub fn at(id: u64, x: f64, y: f64, timestamp: u64) -> Self {
        Self {
            id,
            x,
            y,
            series: None,
            value: None,
            timestamp: Some(timestamp),
        }
    }

    /// Build a tagged point whose `value` mirrors `y`.
    #[must_use]
    pub fn tagged(id: u64, x: f64, y: f64, series: &str, timestamp: u64) -> Self {
        Self {
            id,
            x,
            y,
            series: Some(series.to_owned()),
            value: Some(y),
            timestamp: Some(timestamp),
        }
    }

    /// The value the range filter compares against: `value`, falling back
    /// to `y`.
    #[must_use]
    pub fn filter_value(&self) -> f64 {
        self.value.unwrap_or(self.y)
    }

    /// Timestamp as seen by the window resolver. Points inside the ring
    /// buffer always carry one; a bare point without it sorts to the epoch.
    #[must_use]
    pub fn resolver_ts(&self) -> u64 {
        self.timestamp.unwrap_or(0)
    }

    /// Timestamp as seen by the aggregation step: `timestamp`, then `x`,
    /// then the supplied fallback (the caller's "now").
    #[must_use]
    pub fn bucket_ts(&self, fallback_ms: u64) -> u64 {
        if let Some(ts) = self.timestamp {
            return ts;
        }
        if self.x.is_finite() && self.x > 0.0 {
            return self.x as u64;
        }
        fallback_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_value_prefers_value_over_y() {
        let mut p = Point::at(1, 0.0, 42.0, 1_000);
        assert_eq!(p.filter_value(), 42.0);
        p.value = Some(7.0);
        assert_eq!(p.filter_value(), 7.0);
    }

    #[test]
    fn bucket_ts_fallback_chain() {
        let p = Point::at(1, 5.0, 0.0, 1_000);
        assert_eq!(p.bucket_ts(99), 1_000);

        let p = Point {
            timestamp: None,
            ..Point::at(1, 5.0, 0.0, 0)
        };
        assert_eq!(p.bucket_ts(99), 5);

        let p = Point {
            timestamp: None,
            x: 0.0,
            ..Point::at(1, 0.0, 0.0, 0)
        };
        assert_eq!(p.bucket_ts(99), 99);
    }

    #[test]
    fn tagged_mirrors_value() {
        let p = Point::tagged(3, 1.0, 55.5, "s1", 10);
        assert_eq!(p.value, Some(55.5));
        assert_eq!(p.series.as_deref(), Some("s1"));
    }
}
