#![forbid(unsafe_code)]

//! Transport-free seed/query boundary.
//!
//! The dashboard can bulk-load a generated dataset instead of waiting for
//! the stream to fill the buffer. This module is the in-process equivalent
//! of that endpoint: a query form with clamped parameters and a command form
//! that parses a JSON body and rejects unknown actions with a structured
//! error. Failures here never propagate into the pipeline; the caller logs
//! and keeps operating on locally generated data.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::generate::generate_dataset;
use crate::point::Point;
use crate::time::unix_now_ms;

/// Inclusive clamp range for the requested point count.
pub const COUNT_RANGE: (usize, usize) = (100, 50_000);

/// Inclusive clamp range for the requested series count.
pub const SERIES_RANGE: (usize, usize) = (1, 10);

const DEFAULT_COUNT: usize = 10_000;
const DEFAULT_SERIES: usize = 3;

/// Query-form request: how many points per series, how many series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedQuery {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_series")]
    pub series: usize,
}

fn default_count() -> usize {
    DEFAULT_COUNT
}

fn default_series() -> usize {
    DEFAULT_SERIES
}

impl Default for SeedQuery {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            series: DEFAULT_SERIES,
        }
    }
}

impl SeedQuery {
    /// Clamp the request into the supported ranges. Out-of-range values are
    /// accepted and corrected, never rejected.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            count: self.count.clamp(COUNT_RANGE.0, COUNT_RANGE.1),
            series: self.series.clamp(SERIES_RANGE.0, SERIES_RANGE.1),
        }
    }
}

/// Command-form request body: `{"action":"stream"|"generate", ...}`.
#[derive(Debug, Clone, Deserialize)]
struct SeedCommandBody {
    action: Option<String>,
    count: Option<usize>,
    series: Option<usize>,
}

/// Metadata accompanying every successful seed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedMetadata {
    /// Number of points actually returned.
    pub count: usize,
    /// Number of series actually generated.
    pub series: usize,
    /// Generation time, epoch ms.
    pub timestamp: u64,
}

/// A generated dataset plus its metadata. `ok` is always `true` here;
/// failures are a [`SeedError`] instead, but consumers of the serialized
/// form key off the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResponse {
    pub ok: bool,
    pub data: Vec<Point>,
    pub metadata: SeedMetadata,
}

/// Input-validation failures at the seed boundary.
///
/// Surfaced as structured values, never panics; the pipeline treats them as
/// a reason to keep its current data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    /// The command body was missing an action or named an unknown one.
    InvalidAction(String),
    /// The command body was not valid JSON.
    MalformedBody(String),
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedError::InvalidAction(action) => {
                write!(f, "invalid action {action:?}: must be \"stream\" or \"generate\"")
            }
            SeedError::MalformedBody(msg) => write!(f, "malformed request body: {msg}"),
        }
    }
}

impl std::error::Error for SeedError {}

/// Serve the query form: clamp, generate, wrap with metadata.
#[must_use]
pub fn serve_query(query: SeedQuery) -> SeedResponse {
    let query = query.clamped();
    let now = unix_now_ms();
    let data = generate_dataset(query.count, query.series, now);
    let count = data.len();
    SeedResponse {
        ok: true,
        data,
        metadata: SeedMetadata {
            count,
            series: query.series,
            timestamp: now,
        },
    }
}

/// Serve the command form from a raw JSON body.
///
/// A missing or unknown action and an unparseable body both yield a
/// [`SeedError`] with a message, matching the taxonomy of the boundary:
/// validation errors are responses, not panics.
pub fn serve_command(body: &str) -> Result<SeedResponse, SeedError> {
    let body: SeedCommandBody =
        serde_json::from_str(body).map_err(|e| SeedError::MalformedBody(e.to_string()))?;

    let action = body.action.unwrap_or_default();
    match action.as_str() {
        "stream" | "generate" => {}
        other => return Err(SeedError::InvalidAction(other.to_owned())),
    }

    let count = body.count.unwrap_or(10);
    let series = body.series.unwrap_or(DEFAULT_SERIES);
    let now = unix_now_ms();
    let data = generate_dataset(count, series, now);
    let count = data.len();
    Ok(SeedResponse {
        ok: true,
        data,
        metadata: SeedMetadata {
            count,
            series,
            timestamp: now,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_query_is_clamped() {
        let q = SeedQuery {
            count: 999_999,
            series: 50,
        }
        .clamped();
        assert_eq!(q.count, 50_000);
        assert_eq!(q.series, 10);
    }

    #[test]
    fn undersized_query_is_clamped_up() {
        let q = SeedQuery {
            count: 1,
            series: 0,
        }
        .clamped();
        assert_eq!(q.count, 100);
        assert_eq!(q.series, 1);
    }

    #[test]
    fn query_response_metadata_matches_data() {
        let resp = serve_query(SeedQuery {
            count: 200,
            series: 2,
        });
        assert_eq!(resp.data.len(), 400);
        assert_eq!(resp.metadata.count, 400);
        assert_eq!(resp.metadata.series, 2);
    }

    #[test]
    fn command_rejects_missing_action() {
        let err = serve_command(r#"{"count": 10}"#).unwrap_err();
        assert!(matches!(err, SeedError::InvalidAction(_)));
    }

    #[test]
    fn command_rejects_unknown_action() {
        let err = serve_command(r#"{"action":"explode"}"#).unwrap_err();
        assert_eq!(err, SeedError::InvalidAction("explode".to_owned()));
        assert!(err.to_string().contains("explode"));
    }

    #[test]
    fn command_rejects_garbage_body() {
        let err = serve_command("not json at all").unwrap_err();
        assert!(matches!(err, SeedError::MalformedBody(_)));
    }

    #[test]
    fn responses_carry_the_success_flag() {
        let resp = serve_query(SeedQuery {
            count: 100,
            series: 1,
        });
        assert!(resp.ok);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ok"], true);
    }

    #[test]
    fn command_defaults_count_and_series() {
        let resp = serve_command(r#"{"action":"stream"}"#).unwrap();
        assert_eq!(resp.data.len(), 30); // 10 points x 3 series
        assert_eq!(resp.metadata.series, 3);
    }
}
