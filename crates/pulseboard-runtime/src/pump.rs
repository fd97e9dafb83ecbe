#![forbid(unsafe_code)]

//! Frame-paced render scheduling.
//!
//! The pump decouples drawing from both the ingestion rate and the display's
//! native refresh rate. It is driven by scheduling ticks (a display-synced
//! primitive, or [`FrameTicker`] standing in for one) and draws at most once
//! per [`FRAME_INTERVAL_MS`]; ticks that arrive early reschedule without
//! drawing.
//!
//! # Drift control
//!
//! After a draw the time anchor moves to `now - (elapsed % interval)` rather
//! than `now`: the remainder carries into the next frame, so over thousands
//! of frames the effective rate averages to the target instead of slowly
//! sliding below it.
//!
//! # Backpressure
//!
//! The draw callback reads the latest published slice through
//! [`SharedSlice`] at draw time, never a value captured at schedule time.
//! Any number of buffer appends between two draws collapse into one redraw;
//! a fast producer cannot push the UI past the frame cap.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pulseboard_core::Point;
use pulseboard_pipeline::cancel::{StopSignal, StopTrigger};

use crate::surface::Surface;

/// Target frame rate.
pub const TARGET_FPS: f64 = 60.0;

/// Minimum interval between draws, in milliseconds.
pub const FRAME_INTERVAL_MS: f64 = 1_000.0 / TARGET_FPS;

/// Atomically swapped handle to the current visible slice.
///
/// The resolver publishes a full replacement on every recompute; readers
/// get a cheap `Arc` clone of whatever is current. The lock is held only
/// for the pointer swap, never across a draw.
#[derive(Clone, Default)]
pub struct SharedSlice {
    inner: Arc<Mutex<Arc<Vec<Point>>>>,
}

impl SharedSlice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published slice.
    pub fn publish(&self, slice: Vec<Point>) {
        if let Ok(mut current) = self.inner.lock() {
            *current = Arc::new(slice);
        }
    }

    /// The latest published slice.
    #[must_use]
    pub fn load(&self) -> Arc<Vec<Point>> {
        self.inner
            .lock()
            .map(|current| current.clone())
            .unwrap_or_default()
    }
}

/// Monotonic time source for frame pacing. Injected so tests can drive the
/// pump with a scripted clock.
pub trait FrameClock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> f64;
}

/// Wall clock anchored at construction.
pub struct SystemFrameClock {
    origin: Instant,
}

impl Default for SystemFrameClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl SystemFrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameClock for SystemFrameClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1_000.0
    }
}

/// Draw callback: surface plus the latest visible slice.
pub type DrawFn = Box<dyn FnMut(&mut Surface, &[Point])>;

/// The frame-rate-capped scheduler driving redraws.
pub struct RenderPump {
    surface: Surface,
    slice: SharedSlice,
    draw: DrawFn,
    frame_interval_ms: f64,
    last_draw_ms: f64,
    frames_drawn: u64,
    torn_down: bool,
}

impl RenderPump {
    #[must_use]
    pub fn new(surface: Surface, slice: SharedSlice, draw: DrawFn) -> Self {
        Self {
            surface,
            slice,
            draw,
            frame_interval_ms: FRAME_INTERVAL_MS,
            last_draw_ms: 0.0,
            frames_drawn: 0,
            torn_down: false,
        }
    }

    /// One scheduling tick at `now_ms`. Draws if a full frame interval has
    /// elapsed since the anchor; otherwise just waits for the next tick.
    /// Returns whether a draw happened. No-op after teardown.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if self.torn_down {
            return false;
        }

        let elapsed = now_ms - self.last_draw_ms;
        if elapsed < self.frame_interval_ms {
            return false;
        }

        // Carry the remainder forward instead of re-anchoring at `now`,
        // otherwise the anchor drifts late by the overshoot every frame.
        self.last_draw_ms = now_ms - (elapsed % self.frame_interval_ms);

        let slice = self.slice.load();
        (self.draw)(&mut self.surface, &slice);
        self.frames_drawn += 1;
        true
    }

    /// Apply a size change between frames.
    #[must_use]
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// The current time anchor (test observability for drift bounds).
    #[must_use]
    pub fn anchor_ms(&self) -> f64 {
        self.last_draw_ms
    }

    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Stop drawing. Safe to call any number of times.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            tracing::debug!(frames = self.frames_drawn, "render pump torn down");
        }
        self.torn_down = true;
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

/// Stand-in for a display-synced scheduling primitive: a thread that emits
/// ticks at a fixed cadence until stopped.
///
/// The receiving half paces the caller's run loop; dropping or stopping the
/// ticker cancels the pending schedule deterministically.
pub struct FrameTicker {
    trigger: Option<StopTrigger>,
    thread: Option<thread::JoinHandle<()>>,
}

impl FrameTicker {
    /// Start ticking every `interval`. Returns the ticker handle and the
    /// tick channel.
    #[must_use]
    pub fn start(interval: Duration) -> (Self, mpsc::Receiver<()>) {
        let (tick_tx, tick_rx) = mpsc::channel();
        let (signal, trigger) = StopSignal::new();

        let thread = thread::Builder::new()
            .name("pulseboard-frames".to_owned())
            .spawn(move || {
                while !signal.wait_timeout(interval) {
                    if tick_tx.send(()).is_err() {
                        break;
                    }
                }
            })
            .ok();

        if thread.is_none() {
            tracing::warn!("frame ticker thread unavailable; no ticks will arrive");
        }

        (
            Self {
                trigger: Some(trigger),
                thread,
            },
            tick_rx,
        )
    }

    /// Cancel the pending schedule and join the thread. Idempotent.
    pub fn stop(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            trigger.stop();
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_pump() -> (RenderPump, Rc<Cell<u64>>) {
        let draws = Rc::new(Cell::new(0));
        let draws_in_cb = draws.clone();
        let pump = RenderPump::new(
            Surface::new(100.0, 100.0),
            SharedSlice::new(),
            Box::new(move |_, _| draws_in_cb.set(draws_in_cb.get() + 1)),
        );
        (pump, draws)
    }

    #[test]
    fn early_tick_skips_draw() {
        let (mut pump, draws) = counting_pump();
        assert!(pump.tick(20.0)); // first frame
        assert!(!pump.tick(25.0)); // 5ms later: too early
        assert!(pump.tick(40.0));
        assert_eq!(draws.get(), 2);
    }

    #[test]
    fn eighteen_ms_cadence_draws_every_tick_without_drift() {
        let (mut pump, draws) = counting_pump();
        let mut now = 0.0;
        for _ in 0..10_000 {
            now += 18.0;
            assert!(pump.tick(now), "18ms >= frame interval, must draw");
            // The anchor stays within one frame interval of the tick time.
            let drift = now - pump.anchor_ms();
            assert!(
                (0.0..FRAME_INTERVAL_MS).contains(&drift),
                "anchor drifted {drift}ms"
            );
        }
        assert_eq!(draws.get(), 10_000);
    }

    #[test]
    fn draw_reads_latest_published_slice() {
        let slice = SharedSlice::new();
        let seen = Rc::new(Cell::new(0usize));
        let seen_in_cb = seen.clone();
        let mut pump = RenderPump::new(
            Surface::new(10.0, 10.0),
            slice.clone(),
            Box::new(move |_, pts| seen_in_cb.set(pts.len())),
        );

        pump.tick(20.0);
        assert_eq!(seen.get(), 0);

        // Publish twice between frames: only the latest is drawn.
        slice.publish(vec![Point::at(1, 0.0, 0.0, 1)]);
        slice.publish(vec![
            Point::at(1, 0.0, 0.0, 1),
            Point::at(2, 0.0, 0.0, 2),
            Point::at(3, 0.0, 0.0, 3),
        ]);
        pump.tick(40.0);
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn teardown_is_idempotent_and_stops_draws() {
        let (mut pump, draws) = counting_pump();
        pump.tick(20.0);
        pump.teardown();
        pump.teardown();
        assert!(pump.is_torn_down());
        assert!(!pump.tick(100.0));
        assert_eq!(draws.get(), 1);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemFrameClock::new();
        let a = clock.now_ms();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.now_ms();
        assert!(a >= 0.0);
        assert!(b > a);
    }

    #[test]
    fn ticker_delivers_then_stops() {
        let (mut ticker, tick_rx) = FrameTicker::start(Duration::from_millis(1));
        tick_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("tick before timeout");
        ticker.stop();
        ticker.stop();
        while tick_rx.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(10));
        assert!(tick_rx.try_recv().is_err());
    }
}
