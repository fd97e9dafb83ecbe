#![forbid(unsafe_code)]

//! Pulseboard Pipeline
//!
//! The compute stages between the ring buffer and the render pump.
//!
//! # Key Components
//!
//! - [`resolver`] - Window/filter resolution of the visible slice
//! - [`aggregate`] - Time-bucket averaging, inline or on a worker thread
//! - [`stream`] - Simulated point producers and the timer-driven driver
//! - [`cancel`] - Stop signal shared by the driver and frame ticker
//!
//! # Role in Pulseboard
//! Everything here is pull-driven by the composition root in
//! `pulseboard-runtime`: the resolver recomputes on demand, the aggregator
//! runs only on the periodic refresh path, and the stream driver delivers
//! batches over a channel that the root drains between scheduler turns.

pub mod aggregate;
pub mod cancel;
pub mod resolver;
pub mod stream;

pub use aggregate::{Aggregator, InlineAggregator, WorkerAggregator, bucketize, select_aggregator};
pub use resolver::{apply_filters, compute_visible, compute_visible_aggregated};
pub use stream::{BurstProducer, Producer, SteadyProducer, StreamDriver};
