//! Touch interaction events and the bounded history buffer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Kinds of touch interaction recorded during monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchKind {
    Press,
    Release,
    Swipe,
    Tap,
}

/// One interaction recorded while continuous monitoring is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouchEvent {
    #[serde(rename = "type")]
    pub kind: TouchKind,
    pub x: f64,
    pub y: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

impl TouchEvent {
    pub fn new(kind: TouchKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            x,
            y,
            timestamp: Utc::now(),
            pressure: None,
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }
}

/// Ring buffer holding the most recent touch interactions.
pub const TOUCH_BUFFER_CAPACITY: usize = 100;

/// Bounded most-recent-N buffer of touch events, oldest evicted first.
///
/// Gating on monitoring state is the monitor's concern; the buffer itself
/// always accepts. Snapshotting does not clear: clearing is tied to tick
/// completion, not to buffer access.
#[derive(Debug, Default)]
pub struct TouchEventBuffer {
    events: VecDeque<TouchEvent>,
}

impl TouchEventBuffer {
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(TOUCH_BUFFER_CAPACITY),
        }
    }

    /// Append an event, evicting the oldest entry when at capacity.
    pub fn push(&mut self, event: TouchEvent) {
        if self.events.len() == TOUCH_BUFFER_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Copy the buffered events in arrival order without clearing.
    pub fn snapshot(&self) -> Vec<TouchEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
