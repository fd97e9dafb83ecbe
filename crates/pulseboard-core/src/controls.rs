#![forbid(unsafe_code)]

//! Shared control state read by the resolver on every recompute.
//!
//! Single-writer discipline: [`ControlState`] is initialized with defaults at
//! pipeline start and mutated only by the control-bus event handlers owned by
//! the composition root. The resolver and render pump are readers.

use serde::{Deserialize, Serialize};

/// Visible time window selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    /// Unbounded: the whole retained buffer.
    #[default]
    All,
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl TimeRange {
    /// Window width in milliseconds; `None` means unbounded.
    #[must_use]
    pub fn window_ms(self) -> Option<u64> {
        match self {
            TimeRange::All => None,
            TimeRange::OneMinute => Some(60_000),
            TimeRange::FiveMinutes => Some(300_000),
            TimeRange::FifteenMinutes => Some(900_000),
            TimeRange::OneHour => Some(3_600_000),
        }
    }
}

/// Aggregation level for the periodic refresh path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationLevel {
    /// No bucketing: pass the slice through untouched.
    #[default]
    Raw,
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "1hour")]
    OneHour,
}

impl AggregationLevel {
    /// Bucket width in milliseconds; `None` for raw passthrough.
    #[must_use]
    pub fn bucket_ms(self) -> Option<u64> {
        match self {
            AggregationLevel::Raw => None,
            AggregationLevel::OneMinute => Some(60_000),
            AggregationLevel::FiveMinutes => Some(300_000),
            AggregationLevel::OneHour => Some(3_600_000),
        }
    }
}

/// Series selection for the tag filter.
///
/// Serializes as a plain string: `"all"` for the wildcard, the tag name
/// otherwise, matching the event payloads the UI controls emit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SeriesFilter {
    /// Match every series.
    #[default]
    All,
    /// Match only points whose tag equals this name.
    Only(String),
}

impl From<String> for SeriesFilter {
    fn from(s: String) -> Self {
        if s == "all" {
            SeriesFilter::All
        } else {
            SeriesFilter::Only(s)
        }
    }
}

impl From<SeriesFilter> for String {
    fn from(f: SeriesFilter) -> Self {
        match f {
            SeriesFilter::All => "all".to_owned(),
            SeriesFilter::Only(name) => name,
        }
    }
}

impl SeriesFilter {
    /// Whether a point with the given tag passes the filter.
    #[must_use]
    pub fn matches(&self, series: Option<&str>) -> bool {
        match self {
            SeriesFilter::All => true,
            SeriesFilter::Only(name) => series == Some(name.as_str()),
        }
    }
}

/// Value-range and series filters applied after windowing.
///
/// `min`/`max` are inclusive at both ends. An inverted range (`min > max`)
/// is accepted as-is and simply matches nothing; user input is not
/// corrected automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceFilters {
    pub series: SeriesFilter,
    pub min: f64,
    pub max: f64,
}

impl Default for SliceFilters {
    fn default() -> Self {
        Self {
            series: SeriesFilter::All,
            min: 0.0,
            max: 100.0,
        }
    }
}

/// The shared configuration read by the resolver on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    pub range: TimeRange,
    pub aggregation: AggregationLevel,
    pub zoom: f64,
    /// How far the window end trails "now", in seconds.
    pub offset_secs: f64,
    /// Whether the simulated stream is running.
    pub live: bool,
    pub filters: SliceFilters,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            range: TimeRange::All,
            aggregation: AggregationLevel::Raw,
            zoom: 1.0,
            offset_secs: 0.0,
            live: true,
            filters: SliceFilters::default(),
        }
    }
}
