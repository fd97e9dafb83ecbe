#![forbid(unsafe_code)]

//! Pulseboard Core
//!
//! Data model and shared state for the Pulseboard streaming pipeline.
//!
//! # Key Components
//!
//! - [`point::Point`] - The telemetry sample every stage of the pipeline moves around
//! - [`ring::RingBuffer`] - Capacity-bounded, append-at-tail/evict-at-head point store
//! - [`controls::ControlState`] - Range/aggregation/filter configuration, single-writer
//! - [`bus::ControlBus`] - Typed publish/subscribe channel for UI control events
//! - [`generate`] - Random-walk dataset and realtime point generation
//! - [`seed`] - Transport-free seed/query boundary with clamped parameters
//!
//! # Role in Pulseboard
//! This crate holds everything the resolver, aggregator and render pump agree
//! on: sample shape, buffer semantics, control-event contracts. It has no
//! opinion about scheduling; `pulseboard-pipeline` and `pulseboard-runtime`
//! layer that on top.

pub mod bus;
pub mod controls;
pub mod generate;
pub mod point;
pub mod ring;
pub mod seed;
pub mod time;

pub use bus::{ControlBus, ControlEvent, ControlPublisher};
pub use controls::{AggregationLevel, ControlState, SeriesFilter, SliceFilters, TimeRange};
pub use point::Point;
pub use ring::RingBuffer;
