#![forbid(unsafe_code)]

//! Time-bucket averaging, inline or offloaded to a worker thread.
//!
//! Bucketing groups a slice into fixed-width time windows
//! (`bucket_start = floor(ts / width) * width`), accumulates sum and count
//! per bucket, and emits one averaged point per bucket, ascending by bucket
//! start. The bucket accumulators exist only for the duration of one call.
//!
//! # Strategy seam
//!
//! [`Aggregator`] has two implementations selected once at startup:
//! [`InlineAggregator`] runs [`bucketize`] in the calling context;
//! [`WorkerAggregator`] sends each slice to a dedicated thread as an
//! id-tagged request and correlates the id-tagged response. The two paths
//! are numerically identical — both are the same `bucketize` over the same
//! input order — and the parity is tested explicitly. If the worker cannot
//! be spawned the selection falls back to inline with no caller-visible
//! difference.
//!
//! # Cancellation
//!
//! A caller torn down with requests in flight simply never collects its
//! responses; the worker is stateless per request, so no cancel message is
//! needed. Dropping the [`WorkerAggregator`] closes the request channel and
//! the worker thread exits.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use pulseboard_core::controls::AggregationLevel;
use pulseboard_core::Point;

/// Slices at or below this length skip aggregation entirely; the bucketing
/// cost is only justified above it.
pub const AGGREGATION_THRESHOLD: usize = 10_000;

/// Bucket a slice into fixed-width time windows and average each bucket.
///
/// `Raw` is an identity passthrough. The bucket timestamp for a point falls
/// back `timestamp → x → now_ms`. Output points carry the bucket start as
/// `id`, `x` and `timestamp`, ascending by bucket start.
#[must_use]
pub fn bucketize(slice: &[Point], level: AggregationLevel, now_ms: u64) -> Vec<Point> {
    let Some(bucket_ms) = level.bucket_ms() else {
        return slice.to_vec();
    };

    let mut buckets: BTreeMap<u64, (f64, u64)> = BTreeMap::new();
    for p in slice {
        let ts = p.bucket_ts(now_ms);
        let start = (ts / bucket_ms) * bucket_ms;
        let entry = buckets.entry(start).or_insert((0.0, 0));
        entry.0 += p.y;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(start, (sum, count))| Point::at(start, start as f64, sum / count as f64, start))
        .collect()
}

/// The aggregation contract both strategies satisfy.
pub trait Aggregator: Send {
    /// Bucket `slice` at `level`. `now_ms` is only used as the final
    /// timestamp fallback for points that carry neither `timestamp` nor a
    /// usable `x`.
    fn aggregate(&mut self, slice: Vec<Point>, level: AggregationLevel, now_ms: u64) -> Vec<Point>;
}

/// Runs the bucketing in the calling context.
pub struct InlineAggregator;

impl Aggregator for InlineAggregator {
    fn aggregate(&mut self, slice: Vec<Point>, level: AggregationLevel, now_ms: u64) -> Vec<Point> {
        bucketize(&slice, level, now_ms)
    }
}

/// Wire shape of one offloaded aggregation request. Tagged with `action`
/// so a transport that mixes message kinds can dispatch without peeking at
/// the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AggregateRequest {
    Aggregate {
        id: u64,
        slice: Vec<Point>,
        agg: AggregationLevel,
        now_ms: u64,
    },
}

/// Wire shape of one worker response. `result` is always sorted ascending
/// by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub id: u64,
    pub result: Vec<Point>,
}

/// Offloads bucketing to a dedicated worker thread.
///
/// Requests carry a locally unique increasing id; responses carry the same
/// id back. Out-of-order responses are parked in a pending map owned by
/// this (caller) side until their request asks for them, so interleaved
/// round trips resolve correctly.
pub struct WorkerAggregator {
    request_tx: mpsc::Sender<AggregateRequest>,
    response_rx: mpsc::Receiver<AggregateResponse>,
    next_id: u64,
    pending: HashMap<u64, Vec<Point>>,
}

impl WorkerAggregator {
    /// Spawn the worker thread. Fails only if the host refuses the thread,
    /// in which case the caller should fall back to [`InlineAggregator`].
    pub fn spawn() -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<AggregateRequest>();
        let (response_tx, response_rx) = mpsc::channel::<AggregateResponse>();

        thread::Builder::new()
            .name("pulseboard-aggregator".to_owned())
            .spawn(move || {
                // Exits when the request channel disconnects on drop.
                while let Ok(AggregateRequest::Aggregate {
                    id,
                    slice,
                    agg,
                    now_ms,
                }) = request_rx.recv()
                {
                    let result = bucketize(&slice, agg, now_ms);
                    if response_tx.send(AggregateResponse { id, result }).is_err() {
                        break;
                    }
                }
                tracing::debug!("aggregation worker exiting");
            })?;

        Ok(Self {
            request_tx,
            response_rx,
            next_id: 1,
            pending: HashMap::new(),
        })
    }

    /// An aggregator whose worker is already gone: both channel halves are
    /// dead, so every submit takes the inline fallback.
    #[cfg(test)]
    fn disconnected() -> Self {
        let (request_tx, _) = mpsc::channel();
        let (_, response_rx) = mpsc::channel();
        Self {
            request_tx,
            response_rx,
            next_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Send one request, returning its correlation id.
    ///
    /// On a dead worker the request is handed back and bucketed inline, so
    /// the caller sees no behavioral difference; the result is parked under
    /// the returned id.
    pub fn submit(&mut self, slice: Vec<Point>, level: AggregationLevel, now_ms: u64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let request = AggregateRequest::Aggregate {
            id,
            slice,
            agg: level,
            now_ms,
        };
        if let Err(mpsc::SendError(AggregateRequest::Aggregate {
            slice,
            agg,
            now_ms,
            ..
        })) = self.request_tx.send(request)
        {
            tracing::warn!(id, "aggregation worker gone, bucketing inline");
            let result = bucketize(&slice, agg, now_ms);
            self.pending.insert(id, result);
        }
        id
    }

    /// Collect the response for `id`, parking any responses that belong to
    /// other in-flight requests.
    pub fn collect(&mut self, id: u64) -> Vec<Point> {
        if let Some(result) = self.pending.remove(&id) {
            return result;
        }
        while let Ok(response) = self.response_rx.recv() {
            if response.id == id {
                return response.result;
            }
            self.pending.insert(response.id, response.result);
        }
        // Channel disconnected with the response unaccounted for: the
        // worker died mid-request. Nothing to show; the caller keeps its
        // last good slice.
        tracing::warn!(id, "aggregation response lost, returning empty");
        Vec::new()
    }
}

impl Aggregator for WorkerAggregator {
    fn aggregate(&mut self, slice: Vec<Point>, level: AggregationLevel, now_ms: u64) -> Vec<Point> {
        let id = self.submit(slice, level, now_ms);
        self.collect(id)
    }
}

/// Capability-checked selection: the worker strategy when a thread is
/// available, inline otherwise. Called once at startup.
#[must_use]
pub fn select_aggregator() -> Box<dyn Aggregator> {
    match WorkerAggregator::spawn() {
        Ok(worker) => Box::new(worker),
        Err(e) => {
            tracing::warn!(error = %e, "aggregation worker unavailable, running inline");
            Box::new(InlineAggregator)
        }
    }
}
