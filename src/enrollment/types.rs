//! Capture sample types recorded during the enrollment stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One character entry during the typing test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystrokeEvent {
    pub key: String,
    pub press_time: DateTime<Utc>,
    pub release_time: DateTime<Utc>,
    /// Press-to-release duration in milliseconds
    pub hold_ms: u64,
    /// Delay since the previous key's release; 0 for the first key
    pub inter_key_delay_ms: u64,
}

impl KeystrokeEvent {
    /// Build a keystroke from raw press/release times. `previous_release` is
    /// `None` for the first key of an attempt.
    pub fn from_times(
        key: impl Into<String>,
        press_time: DateTime<Utc>,
        release_time: DateTime<Utc>,
        previous_release: Option<DateTime<Utc>>,
    ) -> Self {
        let hold_ms = (release_time - press_time).num_milliseconds().max(0) as u64;
        let inter_key_delay_ms = previous_release
            .map(|prev| (press_time - prev).num_milliseconds().max(0) as u64)
            .unwrap_or(0);
        Self {
            key: key.into(),
            press_time,
            release_time,
            hold_ms,
            inter_key_delay_ms,
        }
    }
}

/// Swipe directions, in the order the swipe stage requires them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Right,
    Down,
    Left,
    Up,
}

impl std::fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SwipeDirection::Right => "right",
            SwipeDirection::Down => "down",
            SwipeDirection::Left => "left",
            SwipeDirection::Up => "up",
        };
        write!(f, "{s}")
    }
}

/// A raw swipe gesture as reported by the UI layer, before acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeGesture {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub duration_ms: u64,
}

impl SwipeGesture {
    /// Euclidean displacement of the gesture.
    pub fn distance(&self) -> f64 {
        let dx = self.end_x - self.start_x;
        let dy = self.end_y - self.start_y;
        dx.hypot(dy)
    }

    /// Dominant-axis direction: whichever axis moved further wins, screen
    /// coordinates (y grows downward).
    pub fn direction(&self) -> SwipeDirection {
        let dx = self.end_x - self.start_x;
        let dy = self.end_y - self.start_y;
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            }
        } else if dy > 0.0 {
            SwipeDirection::Down
        } else {
            SwipeDirection::Up
        }
    }

    /// Speed in px/ms, guarding against zero-duration gestures.
    pub fn speed(&self) -> f64 {
        self.distance() / self.duration_ms.max(1) as f64
    }
}

/// One accepted directional swipe. Only gestures that matched the expected
/// direction and cleared the displacement threshold become samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeSample {
    pub direction: SwipeDirection,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub duration_ms: u64,
    /// px/ms
    pub speed: f64,
    pub distance: f64,
    pub timestamp: DateTime<Utc>,
}

impl SwipeSample {
    pub fn from_gesture(gesture: &SwipeGesture) -> Self {
        Self {
            direction: gesture.direction(),
            start_x: gesture.start_x,
            start_y: gesture.start_y,
            end_x: gesture.end_x,
            end_y: gesture.end_y,
            duration_ms: gesture.duration_ms,
            speed: gesture.speed(),
            distance: gesture.distance(),
            timestamp: Utc::now(),
        }
    }
}

/// One reaction-time trial from the tap stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapSample {
    pub target_x: f64,
    pub target_y: f64,
    pub tap_x: f64,
    pub tap_y: f64,
    pub reaction_ms: u64,
    /// Distance from the tap point to the target center
    pub miss_distance: f64,
    pub timestamp: DateTime<Utc>,
}
