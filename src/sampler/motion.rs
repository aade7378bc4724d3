//! Motion sampling on top of a platform sensor capability.
//!
//! The capability emits already-timestamped samples into a bounded channel at
//! a fixed interval; the sampler pumps that channel into ordered per-sensor
//! buffers on every access, so all buffer mutation stays on the session
//! thread.

use crate::sampler::types::{MotionSample, SensorKind, SensorWindow};
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Fixed sampling interval for both sensors.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Per-sensor delivery channel capacity. At 10 Hz this is several minutes of
/// backlog before the capability sees backpressure.
const CHANNEL_CAPACITY: usize = 4096;

/// Errors raised by a sensor capability at subscription time.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Sensor unavailable: {0}")]
    Unavailable(String),

    #[error("Motion permission denied")]
    PermissionDenied,
}

/// A live sensor subscription. Dropping it detaches the listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// A subscription that runs `cancel` when dropped.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to detach.
    pub fn detached() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Access to the device motion sensors.
///
/// Implementations emit one timestamped sample into `sink` per `interval`
/// until the returned [`Subscription`] is dropped.
pub trait MotionCapability: Send + Sync {
    fn subscribe(
        &self,
        kind: SensorKind,
        interval: Duration,
        sink: Sender<MotionSample>,
    ) -> Result<Subscription, CapabilityError>;
}

struct ActiveFeed {
    accel_rx: Receiver<MotionSample>,
    gyro_rx: Receiver<MotionSample>,
    _subscriptions: Vec<Subscription>,
}

/// Buffers accelerometer and gyroscope samples between `start()` and a drain.
pub struct MotionSampler {
    capability: Arc<dyn MotionCapability>,
    sample_interval: Duration,
    accelerometer: Vec<MotionSample>,
    gyroscope: Vec<MotionSample>,
    feed: Option<ActiveFeed>,
}

impl MotionSampler {
    /// Create a sampler over `capability` at the default 100 ms interval.
    pub fn new(capability: Arc<dyn MotionCapability>) -> Self {
        Self::with_interval(capability, SAMPLE_INTERVAL)
    }

    pub fn with_interval(capability: Arc<dyn MotionCapability>, sample_interval: Duration) -> Self {
        Self {
            capability,
            sample_interval,
            accelerometer: Vec::new(),
            gyroscope: Vec::new(),
            feed: None,
        }
    }

    /// Reset buffers and subscribe to both sensors.
    ///
    /// Calling `start()` while already active is a no-op: the existing
    /// subscriptions and buffered samples are kept, and no duplicate
    /// subscription is created.
    pub fn start(&mut self) -> Result<(), CapabilityError> {
        if self.feed.is_some() {
            tracing::debug!("motion sampler already running, ignoring start");
            return Ok(());
        }

        self.accelerometer.clear();
        self.gyroscope.clear();

        let (accel_tx, accel_rx) = bounded(CHANNEL_CAPACITY);
        let (gyro_tx, gyro_rx) = bounded(CHANNEL_CAPACITY);

        let accel_sub =
            self.capability
                .subscribe(SensorKind::Accelerometer, self.sample_interval, accel_tx)?;
        let gyro_sub =
            self.capability
                .subscribe(SensorKind::Gyroscope, self.sample_interval, gyro_tx)?;

        self.feed = Some(ActiveFeed {
            accel_rx,
            gyro_rx,
            _subscriptions: vec![accel_sub, gyro_sub],
        });
        Ok(())
    }

    /// Unsubscribe and return everything accumulated since `start()`.
    pub fn stop(&mut self) -> SensorWindow {
        self.pump();
        // Dropping the feed detaches both subscriptions.
        self.feed = None;
        SensorWindow {
            accelerometer: std::mem::take(&mut self.accelerometer),
            gyroscope: std::mem::take(&mut self.gyroscope),
            closed_at: Utc::now(),
        }
    }

    /// Snapshot the buffers without stopping the subscriptions.
    pub fn peek(&mut self) -> SensorWindow {
        self.pump();
        SensorWindow {
            accelerometer: self.accelerometer.clone(),
            gyroscope: self.gyroscope.clone(),
            closed_at: Utc::now(),
        }
    }

    /// Discard buffered and pending samples while staying subscribed.
    pub fn clear(&mut self) {
        self.pump();
        self.accelerometer.clear();
        self.gyroscope.clear();
    }

    pub fn is_running(&self) -> bool {
        self.feed.is_some()
    }

    /// Move pending channel deliveries into the ordered buffers.
    fn pump(&mut self) {
        if let Some(feed) = &self.feed {
            while let Ok(sample) = feed.accel_rx.try_recv() {
                self.accelerometer.push(sample);
            }
            while let Ok(sample) = feed.gyro_rx.try_recv() {
                self.gyroscope.push(sample);
            }
        }
    }
}
