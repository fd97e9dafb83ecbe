#![forbid(unsafe_code)]

//! Simulated point producers and the timer-driven stream driver.
//!
//! The "stream" is a local generator standing in for a real feed. The
//! [`Producer`] seam is the substitution point: a socket-backed source only
//! needs to implement `tick()` and neither the buffer nor the resolver
//! changes.
//!
//! Two producers exist: [`SteadyProducer`] (one point per logical series
//! per tick, the normal stream) and [`BurstProducer`] (several points per
//! series per tick, for load testing). Only one runs at a time; the driver
//! tears the previous timer down deterministically before starting the
//! next.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rand::Rng;

use pulseboard_core::generate::series_tag;
use pulseboard_core::time::unix_now_ms;
use pulseboard_core::Point;

use crate::cancel::{StopSignal, StopTrigger};

/// Default tick interval for the live stream.
pub const DEFAULT_TICK_MS: u64 = 100;

/// A source of point batches, pulled once per tick.
pub trait Producer: Send {
    /// Produce this tick's batch. `now_ms` is the tick's wall-clock time.
    fn tick(&mut self, now_ms: u64) -> Vec<Point>;
}

/// One random point per logical series per tick.
pub struct SteadyProducer {
    series: usize,
    next_id: u64,
}

impl SteadyProducer {
    /// Three-series producer starting its id sequence after `last_id`.
    #[must_use]
    pub fn new(series: usize, last_id: Option<u64>) -> Self {
        Self {
            series,
            next_id: last_id.map_or(0, |id| id + 1),
        }
    }
}

impl Producer for SteadyProducer {
    fn tick(&mut self, now_ms: u64) -> Vec<Point> {
        let mut rng = rand::thread_rng();
        (0..self.series)
            .map(|s| {
                let id = self.next_id;
                self.next_id += 1;
                let y = rng.gen_range(0.0..100.0);
                Point {
                    id,
                    x: now_ms as f64,
                    y,
                    series: Some(series_tag(s)),
                    value: Some(y),
                    timestamp: Some(now_ms),
                }
            })
            .collect()
    }
}

/// Burst mode: `multiplier` points per series per tick, timestamps offset
/// by one millisecond each within the tick so they stay distinguishable.
pub struct BurstProducer {
    series: usize,
    multiplier: usize,
    next_id: u64,
}

impl BurstProducer {
    /// The load-test default: three series at 3x the steady rate.
    #[must_use]
    pub fn new(series: usize, multiplier: usize, last_id: Option<u64>) -> Self {
        Self {
            series,
            multiplier,
            next_id: last_id.map_or(0, |id| id + 1),
        }
    }
}

impl Producer for BurstProducer {
    fn tick(&mut self, now_ms: u64) -> Vec<Point> {
        let mut rng = rand::thread_rng();
        (0..self.series * self.multiplier)
            .map(|i| {
                let id = self.next_id;
                self.next_id += 1;
                let y = rng.gen_range(0.0..100.0);
                let ts = now_ms + i as u64;
                Point {
                    id,
                    x: ts as f64,
                    y,
                    series: Some(series_tag(i % self.series)),
                    value: Some(y),
                    timestamp: Some(ts),
                }
            })
            .collect()
    }
}

struct RunningStream {
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningStream {
    fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Owns the ingestion timer thread.
///
/// Batches are delivered over a channel; the composition root drains the
/// receiving half between scheduler turns and is the buffer's only
/// appender. `start` always tears down the previous timer before starting
/// the new one, so at most one producer runs at a time. `stop` is
/// idempotent.
pub struct StreamDriver {
    batch_tx: mpsc::Sender<Vec<Point>>,
    running: Option<RunningStream>,
}

impl StreamDriver {
    /// Create a driver plus the receiving half of its batch channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<Vec<Point>>) {
        let (batch_tx, batch_rx) = mpsc::channel();
        (
            Self {
                batch_tx,
                running: None,
            },
            batch_rx,
        )
    }

    /// Whether a timer thread is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start ticking `producer` every `interval_ms`, stopping any previous
    /// timer first.
    pub fn start(&mut self, interval_ms: u64, mut producer: Box<dyn Producer>) {
        self.stop();

        let (signal, trigger) = StopSignal::new();
        let batch_tx = self.batch_tx.clone();
        let interval = Duration::from_millis(interval_ms.max(1));

        let spawned = thread::Builder::new()
            .name("pulseboard-stream".to_owned())
            .spawn(move || {
                tracing::debug!(interval_ms, "stream timer started");
                loop {
                    if signal.wait_timeout(interval) {
                        break;
                    }
                    let batch = producer.tick(unix_now_ms());
                    if batch_tx.send(batch).is_err() {
                        break; // receiver gone, pipeline torn down
                    }
                }
                tracing::debug!("stream timer stopped");
            });

        match spawned {
            Ok(handle) => {
                self.running = Some(RunningStream {
                    trigger,
                    thread: Some(handle),
                });
            }
            Err(e) => {
                // Degrade to "no stream": the pipeline keeps serving
                // whatever is already buffered.
                tracing::warn!(error = %e, "could not start stream timer");
            }
        }
    }

    /// Stop the timer thread and join it. Safe to call when not running.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop();
        }
    }
}

impl Drop for StreamDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
