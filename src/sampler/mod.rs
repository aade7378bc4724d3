//! Sensor sampling layer: motion buffering and best-effort location fixes.
//!
//! Platform sensor access sits behind the [`MotionCapability`] and
//! [`LocationCapability`] traits so the same sampling code runs against real
//! bindings, the synthetic driver, or test fakes.

pub mod location;
pub mod motion;
pub mod synthetic;
pub mod types;

pub use location::{
    DeniedLocationCapability, FixedLocationCapability, LocationCapability, LocationError,
    LocationProbe, PermissionStatus,
};
pub use motion::{CapabilityError, MotionCapability, MotionSampler, Subscription, SAMPLE_INTERVAL};
pub use synthetic::{NoopMotionCapability, SyntheticMotionCapability};
pub use types::{LocationFix, MotionSample, SensorKind, SensorWindow};
