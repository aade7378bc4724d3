//! Continuous monitoring: the recurring evidence-collection-and-verification
//! loop that runs after enrollment.

pub mod continuous;
pub mod touch;

pub use continuous::{ContinuousAuthMonitor, MonitorConfig, AUTH_TICK_INTERVAL};
pub use touch::{TouchEvent, TouchEventBuffer, TouchKind, TOUCH_BUFFER_CAPACITY};
