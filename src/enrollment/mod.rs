//! Enrollment: the multi-stage capture flow that builds a subject's
//! behavioral profile.

pub mod aggregator;
pub mod planner;
pub mod types;

pub use aggregator::{
    EnrollmentAggregator, EnrollmentStage, StageInput, StageProgress, DIRECTION_ORDER,
    MIN_SWIPE_DISTANCE, MOTION_HOLD, REFERENCE_SENTENCE, REQUIRED_TYPING_ATTEMPTS,
    SWIPES_PER_DIRECTION, TAP_TARGET_COUNT,
};
pub use planner::{PlannedTarget, TapTargetPlanner, TARGET_SIZE};
pub use types::{KeystrokeEvent, SwipeDirection, SwipeGesture, SwipeSample, TapSample};
