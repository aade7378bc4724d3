//! Sample types produced by the motion and location capabilities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which physical sensor a subscription reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
}

/// One accelerometer or gyroscope reading.
///
/// The capability stamps the sample with the wall clock at emission time, so
/// timing is approximate under sampling jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Wall-clock time at the emission callback, not a sensor-native timestamp
    pub timestamp: DateTime<Utc>,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp: Utc::now(),
        }
    }
}

/// A drained capture session: everything the sampler accumulated between
/// `start()` and the drain, per sensor, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorWindow {
    pub accelerometer: Vec<MotionSample>,
    pub gyroscope: Vec<MotionSample>,
    /// When the window was closed (drained)
    pub closed_at: DateTime<Utc>,
}

impl SensorWindow {
    /// An empty window closed now.
    pub fn empty() -> Self {
        Self {
            accelerometer: Vec::new(),
            gyroscope: Vec::new(),
            closed_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accelerometer.is_empty() && self.gyroscope.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.accelerometer.len() + self.gyroscope.len()
    }
}

/// A single best-effort position fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters, when the platform reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            timestamp: Utc::now(),
        }
    }
}
