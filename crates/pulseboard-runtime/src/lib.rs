#![forbid(unsafe_code)]

//! Pulseboard Runtime
//!
//! The render-facing half of the pipeline and the composition root that
//! wires everything together.
//!
//! # Key Components
//!
//! - [`pump::RenderPump`] - Frame-rate-capped scheduler driving redraws
//! - [`pump::SharedSlice`] - Atomically swapped handle to the visible slice
//! - [`surface::Surface`] - Backing-resolution management with a capped
//!   device pixel ratio
//! - [`viewport`] - O(1) virtual-window calculation for large lists
//! - [`dashboard::Dashboard`] - The composition root and its event handlers
//!
//! # Role in Pulseboard
//! `pulseboard-runtime` is the orchestrator: it drains the stream channel
//! into the buffer, funnels control events into the single-writer state,
//! schedules the throttled aggregated publish, and paces the draw callback
//! at 60 frames per second regardless of how fast data arrives.

pub mod dashboard;
pub mod pump;
pub mod surface;
pub mod viewport;

pub use dashboard::{Dashboard, DashboardConfig};
pub use pump::{FRAME_INTERVAL_MS, FrameClock, FrameTicker, RenderPump, SharedSlice,
    SystemFrameClock, TARGET_FPS};
pub use surface::{MAX_PIXEL_RATIO, ObservedSize, PixelSize, SizeObserver, Surface};
pub use viewport::{OVERSCAN_ROWS, VirtualWindow, VirtualWindowCache, window_for};
