//! Stand-in motion capabilities for hosts without sensor hardware.

use crate::sampler::motion::{CapabilityError, MotionCapability, Subscription};
use crate::sampler::types::{MotionSample, SensorKind};
use crossbeam_channel::Sender;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Accepts subscriptions but never emits a sample.
pub struct NoopMotionCapability;

impl MotionCapability for NoopMotionCapability {
    fn subscribe(
        &self,
        _kind: SensorKind,
        _interval: Duration,
        _sink: Sender<MotionSample>,
    ) -> Result<Subscription, CapabilityError> {
        Ok(Subscription::detached())
    }
}

/// Emits pseudo-random readings from a background thread at the requested
/// interval: small jitter around gravity for the accelerometer, around zero
/// for the gyroscope. Drives the CLI demo commands.
pub struct SyntheticMotionCapability;

impl MotionCapability for SyntheticMotionCapability {
    fn subscribe(
        &self,
        kind: SensorKind,
        interval: Duration,
        sink: Sender<MotionSample>,
    ) -> Result<Subscription, CapabilityError> {
        let stopped = Arc::new(AtomicBool::new(false));
        let thread_stopped = Arc::clone(&stopped);

        thread::spawn(move || {
            let mut rng = rand::rng();
            while !thread_stopped.load(Ordering::SeqCst) {
                let (x, y, z) = match kind {
                    SensorKind::Accelerometer => (
                        rng.random_range(-0.05..0.05),
                        rng.random_range(-0.05..0.05),
                        9.81 + rng.random_range(-0.1..0.1),
                    ),
                    SensorKind::Gyroscope => (
                        rng.random_range(-0.02..0.02),
                        rng.random_range(-0.02..0.02),
                        rng.random_range(-0.02..0.02),
                    ),
                };
                // Receiver dropped means the sampler stopped; wind down.
                if sink.send(MotionSample::new(x, y, z)).is_err() {
                    break;
                }
                thread::sleep(interval);
            }
        });

        Ok(Subscription::new(move || {
            stopped.store(true, Ordering::SeqCst);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::motion::MotionSampler;

    #[test]
    fn test_noop_capability_never_emits() {
        let mut sampler = MotionSampler::new(Arc::new(NoopMotionCapability));
        sampler.start().unwrap();
        thread::sleep(Duration::from_millis(30));
        let window = sampler.stop();
        assert!(window.is_empty());
    }

    #[test]
    fn test_synthetic_capability_emits_at_interval() {
        let mut sampler = MotionSampler::with_interval(
            Arc::new(SyntheticMotionCapability),
            Duration::from_millis(5),
        );
        sampler.start().unwrap();
        thread::sleep(Duration::from_millis(100));
        let window = sampler.stop();
        assert!(!window.accelerometer.is_empty());
        assert!(!window.gyroscope.is_empty());
    }
}
