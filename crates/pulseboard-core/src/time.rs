#![forbid(unsafe_code)]

//! Wall-clock helper for timestamp backfill.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
///
/// Saturates to zero if the system clock reads before the epoch, which keeps
/// the ingestion path panic-free on badly configured hosts.
#[must_use]
pub fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
