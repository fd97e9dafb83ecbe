#![forbid(unsafe_code)]

//! The composition root: wires buffer, controls, bus, stream, aggregation
//! and the render pump into one pipeline.
//!
//! # Scheduling model
//!
//! The main path is single-threaded cooperative: [`Dashboard::run_turn`]
//! drains stream batches, drains control events, runs the throttled publish
//! and gives the render pump one tick, in that order. The only parallel
//! context is the aggregation worker, which shares no memory with this
//! thread and communicates via id-correlated messages.
//!
//! # Single-writer invariant
//!
//! [`pulseboard_core::ControlState`] is mutated exclusively by the event
//! handlers here, one handler per event kind. The resolver and pump read
//! it. Likewise the ring buffer has exactly one appender: the drain step of
//! `run_turn`.
//!
//! # Publish cadence
//!
//! Control changes publish a fresh slice immediately through the sync
//! resolver path. The periodic refresh runs the aggregated path, throttled
//! (default every 2s) because recomputing at the full ingestion rate costs
//! frames without showing more data.

use std::sync::mpsc;
use std::time::Duration;

use pulseboard_core::bus::{ControlEvent, DataControl, StreamControl, TimeRangeChange};
use pulseboard_core::generate::{burst_backfill, initial_dataset};
use pulseboard_core::ring::{BURST_CAPACITY, LIVE_CAPACITY};
use pulseboard_core::time::unix_now_ms;
use pulseboard_core::{ControlBus, ControlPublisher, ControlState, Point, RingBuffer};
use pulseboard_pipeline::cancel::StopSignal;
use pulseboard_pipeline::stream::DEFAULT_TICK_MS;
use pulseboard_pipeline::{
    Aggregator, BurstProducer, SteadyProducer, StreamDriver, compute_visible,
    compute_visible_aggregated, select_aggregator,
};

use crate::pump::{DrawFn, FrameClock, FrameTicker, RenderPump, SharedSlice, SystemFrameClock};
use crate::surface::{SizeObserver, Surface};

/// Startup configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Initial paint dataset: points per series, spread over the trailing
    /// 50 seconds.
    pub initial_points_per_series: usize,
    /// Number of logical series.
    pub series: usize,
    /// Throttle for the periodic aggregated publish.
    pub publish_interval_ms: u64,
    /// Steady stream tick interval.
    pub stream_interval_ms: u64,
    /// Whether the stream starts running.
    pub start_live: bool,
    /// Logical surface size handed to the render pump.
    pub surface_size: (f64, f64),
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            initial_points_per_series: 3_333,
            series: 3,
            publish_interval_ms: 2_000,
            stream_interval_ms: DEFAULT_TICK_MS,
            start_live: true,
            surface_size: (800.0, 400.0),
        }
    }
}

/// The wired pipeline. See the module docs for the scheduling model.
pub struct Dashboard {
    buffer: RingBuffer,
    controls: ControlState,
    bus: ControlBus,
    driver: StreamDriver,
    batch_rx: mpsc::Receiver<Vec<Point>>,
    aggregator: Box<dyn Aggregator>,
    slice: SharedSlice,
    pump: RenderPump,
    clock: Box<dyn FrameClock>,
    series: usize,
    stream_interval_ms: u64,
    publish_interval_ms: u64,
    last_publish_ms: u64,
    size_observer: Option<Box<dyn SizeObserver>>,
    stress: bool,
    shut_down: bool,
}

impl Dashboard {
    /// Build and start the pipeline: seed the initial dataset, publish the
    /// first slice synchronously, start the steady stream if live.
    #[must_use]
    pub fn new(config: DashboardConfig, draw: DrawFn) -> Self {
        Self::with_clock(config, draw, Box::new(SystemFrameClock::new()))
    }

    /// [`Dashboard::new`] with an explicit frame clock. Tests script the
    /// clock to step frame pacing deterministically.
    #[must_use]
    pub fn with_clock(config: DashboardConfig, draw: DrawFn, clock: Box<dyn FrameClock>) -> Self {
        let now = unix_now_ms();

        let mut buffer = RingBuffer::new(LIVE_CAPACITY);
        buffer.append_batch(initial_dataset(
            config.initial_points_per_series,
            config.series,
            now,
        ));

        let controls = ControlState {
            live: config.start_live,
            ..ControlState::default()
        };

        let slice = SharedSlice::new();
        slice.publish(compute_visible(&buffer, &controls, now));

        let (mut driver, batch_rx) = StreamDriver::new();
        if config.start_live {
            driver.start(
                config.stream_interval_ms,
                Box::new(SteadyProducer::new(config.series, buffer.last_id())),
            );
        }

        let (width, height) = config.surface_size;
        let pump = RenderPump::new(Surface::new(width, height), slice.clone(), draw);

        tracing::debug!(
            seeded = buffer.len(),
            live = config.start_live,
            "dashboard pipeline started"
        );

        Self {
            buffer,
            controls,
            bus: ControlBus::new(),
            driver,
            batch_rx,
            aggregator: select_aggregator(),
            slice,
            pump,
            clock,
            series: config.series,
            stream_interval_ms: config.stream_interval_ms,
            publish_interval_ms: config.publish_interval_ms,
            last_publish_ms: now,
            size_observer: None,
            stress: false,
            shut_down: false,
        }
    }

    /// Attach a size observer. The surface syncs to it between frames,
    /// never mid-draw; without one the setup-time size stays in effect.
    pub fn set_size_observer(&mut self, observer: Box<dyn SizeObserver>) {
        self.size_observer = Some(observer);
    }

    /// A publishing handle for a UI control.
    ///
    /// # Panics
    /// After [`Dashboard::shutdown`]: handing out publishers for a dead
    /// pipeline is a wiring bug, not a runtime condition.
    #[must_use]
    pub fn publisher(&self) -> ControlPublisher {
        assert!(
            !self.shut_down,
            "Dashboard::publisher called after shutdown"
        );
        self.bus.publisher()
    }

    /// The render-facing slice handle.
    ///
    /// # Panics
    /// After [`Dashboard::shutdown`], for the same reason as
    /// [`Dashboard::publisher`].
    #[must_use]
    pub fn slice_handle(&self) -> SharedSlice {
        assert!(
            !self.shut_down,
            "Dashboard::slice_handle called after shutdown"
        );
        self.slice.clone()
    }

    /// Current control state (read-only).
    #[must_use]
    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    /// Points currently retained by the buffer.
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.pump.frames_drawn()
    }

    /// One cooperative scheduler turn at `now_ms`: ingest pending batches,
    /// handle control events, run the throttled publish, tick the pump.
    pub fn run_turn(&mut self, now_ms: u64) {
        if self.shut_down {
            return;
        }

        self.drain_batches();

        for event in self.bus.drain() {
            self.handle_event(event, now_ms);
        }

        if now_ms.saturating_sub(self.last_publish_ms) >= self.publish_interval_ms {
            self.last_publish_ms = now_ms;
            let slice =
                compute_visible_aggregated(&self.buffer, &self.controls, now_ms, &mut *self.aggregator);
            self.slice.publish(slice);
        }

        if let Some(observer) = self.size_observer.as_deref_mut() {
            self.pump.surface_mut().sync_from(observer);
        }
        self.pump.tick(self.clock.now_ms());
    }

    /// Drive turns off a frame ticker until `stop` fires. Blocks the
    /// calling thread; teardown happens on exit.
    pub fn run_until(&mut self, stop: &StopSignal) {
        let (mut ticker, tick_rx) = FrameTicker::start(Duration::from_millis(4));
        while !stop.is_stopped() {
            match tick_rx.recv_timeout(Duration::from_millis(50)) {
                Ok(()) | Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            self.run_turn(unix_now_ms());
        }
        ticker.stop();
        self.shutdown();
    }

    /// Stop the stream, the pump and the pipeline. Idempotent; in-flight
    /// aggregation requests are abandoned (the worker is stateless per
    /// request, nothing needs cancelling).
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.driver.stop();
        self.pump.teardown();
        self.shut_down = true;
        tracing::debug!("dashboard pipeline shut down");
    }

    fn drain_batches(&mut self) {
        let capacity = if self.stress {
            BURST_CAPACITY
        } else {
            LIVE_CAPACITY
        };
        let mut appended = false;
        while let Ok(batch) = self.batch_rx.try_recv() {
            if self.buffer.capacity() != capacity {
                self.buffer.set_capacity(capacity);
            }
            self.buffer.append_batch(batch);
            appended = true;
        }
        if appended && self.stress {
            // Stress mode publishes eagerly so the load is visible at once.
            let now = unix_now_ms();
            self.slice
                .publish(compute_visible(&self.buffer, &self.controls, now));
        }
    }

    fn handle_event(&mut self, event: ControlEvent, now_ms: u64) {
        match event {
            ControlEvent::TimeRangeChange(change) => self.on_time_range(change, now_ms),
            ControlEvent::StreamControl(control) => self.on_stream_control(control),
            ControlEvent::DataControl(control) => self.on_data_control(control, now_ms),
        }
    }

    /// Range/filter changes repaint immediately through the sync path.
    fn on_time_range(&mut self, change: TimeRangeChange, now_ms: u64) {
        change.apply(&mut self.controls);
        self.slice
            .publish(compute_visible(&self.buffer, &self.controls, now_ms));
    }

    fn on_stream_control(&mut self, control: StreamControl) {
        let live = control.live();
        self.controls.live = live;
        if live {
            self.stress = false;
            self.stream_interval_ms = control.target_interval_ms();
            self.driver.start(
                self.stream_interval_ms,
                Box::new(SteadyProducer::new(self.series, self.buffer.last_id())),
            );
        } else {
            self.driver.stop();
        }
        tracing::debug!(live, interval_ms = self.stream_interval_ms, "stream control");
    }

    fn on_data_control(&mut self, control: DataControl, now_ms: u64) {
        match control {
            DataControl::IncreaseLoad { count } => {
                let count = count.unwrap_or(5_000);
                self.buffer.set_capacity(BURST_CAPACITY);
                let start_id = self.buffer.last_id().map_or(0, |id| id + 1);
                self.buffer
                    .append_batch(burst_backfill(count, self.series, start_id, now_ms));
                self.slice
                    .publish(compute_visible(&self.buffer, &self.controls, now_ms));
                tracing::debug!(count, total = self.buffer.len(), "bulk backfill");
            }
            DataControl::StressStart { interval_ms } => {
                self.stress = true;
                self.buffer.set_capacity(BURST_CAPACITY);
                self.driver.start(
                    interval_ms.unwrap_or(DEFAULT_TICK_MS),
                    Box::new(BurstProducer::new(self.series, 3, self.buffer.last_id())),
                );
                tracing::debug!("stress mode started");
            }
            DataControl::StressStop => {
                self.stress = false;
                self.driver.stop();
                self.buffer.set_capacity(LIVE_CAPACITY);
                if self.controls.live {
                    self.driver.start(
                        DEFAULT_TICK_MS,
                        Box::new(SteadyProducer::new(self.series, self.buffer.last_id())),
                    );
                }
                tracing::debug!("stress mode stopped");
            }
            DataControl::SetRate { interval_ms } => {
                if self.controls.live {
                    self.stream_interval_ms = interval_ms.unwrap_or(200);
                    self.driver.start(
                        self.stream_interval_ms,
                        Box::new(SteadyProducer::new(self.series, self.buffer.last_id())),
                    );
                }
            }
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.shutdown();
    }
}
