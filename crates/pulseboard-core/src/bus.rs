#![forbid(unsafe_code)]

//! Typed publish/subscribe channel for UI control events.
//!
//! Independent controls (time-range selector, filter panel, load buttons)
//! publish events; the composition root is the single subscriber and owns
//! the effect of each event kind. This replaces ambient fan-out with an
//! explicit channel: publishers are cheap clones of the sending half, and
//! the owner drains the receiving half between scheduler turns, so handlers
//! never block a publisher.
//!
//! # Event kinds
//!
//! - [`TimeRangeChange`]: partial update of range/offset/filters
//! - [`StreamControl`]: start/stop/retarget the ingestion tick
//! - [`DataControl`]: administrative actions (backfill, burst mode, rate)

use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::controls::{AggregationLevel, ControlState, SliceFilters, TimeRange};

/// Partial control-state update. Absent fields leave the current value
/// untouched, mirroring how the UI merges event payloads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeRangeChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SliceFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_secs: Option<f64>,
}

impl TimeRangeChange {
    /// Merge this change into the control state. Only the single-writer
    /// handler in the composition root may call this.
    pub fn apply(&self, state: &mut ControlState) {
        if let Some(range) = self.range {
            state.range = range;
        }
        if let Some(live) = self.live {
            state.live = live;
        }
        if let Some(filters) = &self.filters {
            state.filters = filters.clone();
        }
        if let Some(aggregation) = self.aggregation {
            state.aggregation = aggregation;
        }
        if let Some(offset) = self.offset_secs {
            state.offset_secs = offset;
        }
    }
}

/// Start/stop or retarget the simulated stream.
///
/// Two wire shapes are accepted: the action form the range selector emits
/// (`{"action":"start"}`) and the retarget form (`{"live":true,
/// "targetIntervalMs":200}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamControl {
    Action { action: StreamAction },
    Retarget {
        live: bool,
        #[serde(
            default,
            rename = "targetIntervalMs",
            skip_serializing_if = "Option::is_none"
        )]
        target_interval_ms: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamAction {
    Start,
    Stop,
}

impl StreamControl {
    /// Whether the stream should be running after this event.
    #[must_use]
    pub fn live(&self) -> bool {
        match self {
            StreamControl::Action { action } => matches!(action, StreamAction::Start),
            StreamControl::Retarget { live, .. } => *live,
        }
    }

    /// Requested tick interval. Defaults to 100ms when going live and
    /// 1000ms otherwise.
    #[must_use]
    pub fn target_interval_ms(&self) -> u64 {
        let explicit = match self {
            StreamControl::Action { .. } => None,
            StreamControl::Retarget {
                target_interval_ms, ..
            } => *target_interval_ms,
        };
        explicit.unwrap_or(if self.live() { 100 } else { 1_000 })
    }
}

/// Administrative data actions from the load-control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DataControl {
    /// Bulk-append a batch of generated points (default 5000).
    IncreaseLoad {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<usize>,
    },
    /// Switch ingestion to the burst producer.
    StressStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval_ms: Option<u64>,
    },
    /// Stop burst mode; the steady stream resumes if live.
    StressStop,
    /// Retarget the steady tick interval (default 200ms).
    SetRate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval_ms: Option<u64>,
    },
}

/// A control event, one of the three kinds the pipeline reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlEvent {
    TimeRangeChange(TimeRangeChange),
    StreamControl(StreamControl),
    DataControl(DataControl),
}

/// The receiving half of the bus, owned by the composition root.
pub struct ControlBus {
    sender: mpsc::Sender<ControlEvent>,
    receiver: mpsc::Receiver<ControlEvent>,
}

impl Default for ControlBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Hand out a cloneable publishing handle.
    #[must_use]
    pub fn publisher(&self) -> ControlPublisher {
        ControlPublisher {
            sender: self.sender.clone(),
        }
    }

    /// Drain pending events without blocking.
    pub fn drain(&self) -> Vec<ControlEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Cloneable sending half handed to UI controls.
#[derive(Clone)]
pub struct ControlPublisher {
    sender: mpsc::Sender<ControlEvent>,
}

impl ControlPublisher {
    /// Publish an event. Never blocks; if the owning bus is gone the event
    /// is dropped, which only happens during teardown.
    pub fn publish(&self, event: ControlEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("control event dropped: bus torn down");
        }
    }

    pub fn time_range(&self, change: TimeRangeChange) {
        self.publish(ControlEvent::TimeRangeChange(change));
    }

    pub fn stream(&self, control: StreamControl) {
        self.publish(ControlEvent::StreamControl(control));
    }

    pub fn data(&self, control: DataControl) {
        self.publish(ControlEvent::DataControl(control));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::SeriesFilter;

    #[test]
    fn drain_preserves_publish_order() {
        let bus = ControlBus::new();
        let a = bus.publisher();
        let b = bus.publisher();
        a.stream(StreamControl::Action {
            action: StreamAction::Stop,
        });
        b.data(DataControl::StressStop);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ControlEvent::StreamControl(_)));
        assert!(matches!(events[1], ControlEvent::DataControl(_)));
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn partial_merge_leaves_other_fields() {
        let mut state = ControlState::default();
        let change = TimeRangeChange {
            filters: Some(SliceFilters {
                series: SeriesFilter::Only("s1".into()),
                min: 10.0,
                max: 90.0,
            }),
            ..TimeRangeChange::default()
        };
        change.apply(&mut state);
        assert_eq!(state.range, TimeRange::All);
        assert!(state.live);
        assert_eq!(state.filters.min, 10.0);
        assert_eq!(state.filters.series, SeriesFilter::Only("s1".into()));
    }

    #[test]
    fn stream_control_wire_shapes() {
        let start: StreamControl = serde_json::from_str(r#"{"action":"start"}"#).unwrap();
        assert!(start.live());
        assert_eq!(start.target_interval_ms(), 100);

        let retarget: StreamControl =
            serde_json::from_str(r#"{"live":true,"targetIntervalMs":250}"#).unwrap();
        assert!(retarget.live());
        assert_eq!(retarget.target_interval_ms(), 250);

        let paused: StreamControl = serde_json::from_str(r#"{"live":false}"#).unwrap();
        assert!(!paused.live());
        assert_eq!(paused.target_interval_ms(), 1_000);
    }

    #[test]
    fn data_control_action_tags() {
        let inc: DataControl =
            serde_json::from_str(r#"{"action":"increaseLoad","count":5000}"#).unwrap();
        assert_eq!(inc, DataControl::IncreaseLoad { count: Some(5000) });

        let stress: DataControl =
            serde_json::from_str(r#"{"action":"stressStart","intervalMs":100}"#).unwrap();
        assert_eq!(
            stress,
            DataControl::StressStart {
                interval_ms: Some(100)
            }
        );
    }
}
