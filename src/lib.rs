//! Bioauth Agent - behavioral biometric capture and continuous authentication.
//!
//! This library captures behavioral signals (typing rhythm, swipe kinematics,
//! tap reaction time, device motion, location) during a multi-stage
//! enrollment flow, and afterwards continuously samples touch/motion activity
//! to detect deviation from the enrolled profile via a remote verifier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Bioauth Agent                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │   Sampler   │──▶│  Enrollment  │──▶│   Verifier   │      │
//! │  │ (motion/loc)│   │  Aggregator  │   │    Client    │      │
//! │  └─────────────┘   └──────────────┘   └──────────────┘      │
//! │         │                                    ▲               │
//! │         ▼                                    │               │
//! │  ┌─────────────┐   ┌──────────────┐          │               │
//! │  │    Touch    │──▶│  Continuous  │──────────┘               │
//! │  │   Buffer    │   │ Auth Monitor │  (10 s evidence ticks)   │
//! │  └─────────────┘   └──────────────┘                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one direction per cycle: sensors → buffers → payload assembly
//! → remote call → verdict → callback. All verifier paths fail open: a
//! transport failure yields a legitimate-subject verdict rather than a
//! lockout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bioauth_agent::api::{VerifierClient, VerifierConfig};
//! use bioauth_agent::monitor::{ContinuousAuthMonitor, TouchEvent, TouchKind};
//! use bioauth_agent::sampler::{
//!     DeniedLocationCapability, LocationProbe, MotionSampler, NoopMotionCapability,
//! };
//!
//! # async fn run() {
//! let client = Arc::new(VerifierClient::new(VerifierConfig::new("http://127.0.0.1:3001")));
//! let sampler = MotionSampler::new(Arc::new(NoopMotionCapability));
//! let probe = LocationProbe::new(Arc::new(DeniedLocationCapability));
//!
//! let monitor = ContinuousAuthMonitor::new(client, sampler, probe);
//! monitor.start("user-1234", || println!("anomaly detected, locking out"));
//! monitor.record(TouchEvent::new(TouchKind::Press, 12.0, 300.0));
//! # }
//! ```

pub mod api;
pub mod config;
pub mod enrollment;
pub mod monitor;
pub mod sampler;

// Re-export key types at crate root for convenience
pub use api::{AuthPayload, AuthResponse, EnrollmentPayload, VerifierClient, VerifierConfig};
pub use config::Config;
pub use enrollment::{EnrollmentAggregator, EnrollmentStage, StageInput, StageProgress};
pub use monitor::{ContinuousAuthMonitor, MonitorConfig, TouchEvent, TouchEventBuffer, TouchKind};
pub use sampler::{LocationProbe, MotionSampler, SensorWindow};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
