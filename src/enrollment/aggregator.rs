//! The 5-stage enrollment pipeline.
//!
//! Each stage runs as an independent screen invocation; the aggregator's job
//! is to thread every stage's output forward so no capture is lost across the
//! hand-offs, and to assemble exactly one submission payload at the end.
//! Accumulation is append-only: later stages never touch earlier stages'
//! captured data.

use crate::api::{
    EnrollmentContext, EnrollmentPayload, MotionData, SwipeData, TapData, TypingData,
    VerifierClient,
};
use crate::enrollment::types::{
    KeystrokeEvent, SwipeDirection, SwipeGesture, SwipeSample, TapSample,
};
use crate::sampler::{LocationProbe, MotionSampler, SensorWindow};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Sentence every typing attempt must reproduce (case-insensitive).
pub const REFERENCE_SENTENCE: &str = "The quick brown fox jumps over the lazy dog";

/// Successful typing attempts required before the swipe stage.
pub const REQUIRED_TYPING_ATTEMPTS: usize = 2;

/// Accepted swipes required per direction.
pub const SWIPES_PER_DIRECTION: usize = 3;

/// Fixed direction cycle for the swipe stage.
pub const DIRECTION_ORDER: [SwipeDirection; 4] = [
    SwipeDirection::Right,
    SwipeDirection::Down,
    SwipeDirection::Left,
    SwipeDirection::Up,
];

/// Minimum Euclidean displacement for an accepted swipe, in px.
pub const MIN_SWIPE_DISTANCE: f64 = 50.0;

/// Reaction targets to record before the motion stage.
pub const TAP_TARGET_COUNT: usize = 10;

/// Duration of the hold-still motion capture.
pub const MOTION_HOLD: Duration = Duration::from_secs(10);

/// Enrollment stages, in fixed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentStage {
    /// Typing test, `attempt` is 1-based
    Typing { attempt: usize },
    Swipe,
    Tap,
    Motion,
    Submitting,
    Complete,
    Failed,
}

impl std::fmt::Display for EnrollmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrollmentStage::Typing { attempt } => write!(f, "typing (attempt {attempt})"),
            EnrollmentStage::Swipe => write!(f, "swipe"),
            EnrollmentStage::Tap => write!(f, "tap"),
            EnrollmentStage::Motion => write!(f, "motion"),
            EnrollmentStage::Submitting => write!(f, "submitting"),
            EnrollmentStage::Complete => write!(f, "complete"),
            EnrollmentStage::Failed => write!(f, "failed"),
        }
    }
}

/// One capture result fed into [`EnrollmentAggregator::advance`].
#[derive(Debug, Clone)]
pub enum StageInput {
    /// A completed typing attempt: the transcript plus its keystroke sequence
    TypingAttempt {
        transcript: String,
        keystrokes: Vec<KeystrokeEvent>,
    },
    /// A raw swipe gesture, subject to the acceptance rules
    Swipe(SwipeGesture),
    /// A reaction target became visible at this center point
    ArmTapTarget { x: f64, y: f64 },
    /// A tap landed at this point
    Tap { x: f64, y: f64 },
    /// The timed motion hold finished
    MotionHoldComplete,
}

/// Result of feeding one input: the (possibly advanced) stage and whether the
/// input was recorded. Rejected inputs leave no trace.
#[derive(Debug, Clone)]
pub struct StageProgress {
    pub stage: EnrollmentStage,
    pub accepted: bool,
}

struct ArmedTarget {
    x: f64,
    y: f64,
    armed_at: DateTime<Utc>,
}

/// Threads partial capture results across the enrollment stages and submits
/// one payload at the end.
pub struct EnrollmentAggregator {
    subject_id: String,
    stage: EnrollmentStage,
    sampler: MotionSampler,
    probe: LocationProbe,
    client: Arc<VerifierClient>,

    typing_attempts: Vec<Vec<KeystrokeEvent>>,
    swipes: Vec<SwipeSample>,
    direction_index: usize,
    swipes_for_direction: usize,
    swipe_window: Option<SensorWindow>,
    taps: Vec<TapSample>,
    armed_target: Option<ArmedTarget>,
    tap_window: Option<SensorWindow>,
    motion_window: Option<SensorWindow>,
    payload: Option<EnrollmentPayload>,
}

impl EnrollmentAggregator {
    pub fn new(
        subject_id: impl Into<String>,
        sampler: MotionSampler,
        probe: LocationProbe,
        client: Arc<VerifierClient>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            stage: EnrollmentStage::Typing { attempt: 1 },
            sampler,
            probe,
            client,
            typing_attempts: Vec::new(),
            swipes: Vec::new(),
            direction_index: 0,
            swipes_for_direction: 0,
            swipe_window: None,
            taps: Vec::new(),
            armed_target: None,
            tap_window: None,
            motion_window: None,
            payload: None,
        }
    }

    pub fn stage(&self) -> &EnrollmentStage {
        &self.stage
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// The direction the swipe stage currently expects, while in that stage.
    pub fn expected_direction(&self) -> Option<SwipeDirection> {
        if self.stage == EnrollmentStage::Swipe {
            DIRECTION_ORDER.get(self.direction_index).copied()
        } else {
            None
        }
    }

    /// Accepted swipes toward the current direction's quota.
    pub fn swipes_for_direction(&self) -> usize {
        self.swipes_for_direction
    }

    pub fn typing_attempts(&self) -> &[Vec<KeystrokeEvent>] {
        &self.typing_attempts
    }

    pub fn swipe_samples(&self) -> &[SwipeSample] {
        &self.swipes
    }

    pub fn tap_samples(&self) -> &[TapSample] {
        &self.taps
    }

    /// The assembled payload, available from the first `submit()` call on
    /// (retained on failure for display and inspection).
    pub fn payload(&self) -> Option<&EnrollmentPayload> {
        self.payload.as_ref()
    }

    /// Start the stage's motion capture. Idempotent; called when the subject
    /// begins interacting with a capture stage.
    pub fn begin_capture(&mut self) {
        match self.stage {
            EnrollmentStage::Typing { .. }
            | EnrollmentStage::Swipe
            | EnrollmentStage::Tap
            | EnrollmentStage::Motion => {
                // Missing motion permission degrades to empty windows, it
                // never blocks the flow.
                if let Err(e) = self.sampler.start() {
                    tracing::warn!("motion capture unavailable for {} stage: {e}", self.stage);
                }
            }
            _ => {}
        }
    }

    /// Feed one capture result. Inputs that fail validation or arrive in the
    /// wrong stage are declined without recording anything; the caller prompts
    /// a retry.
    pub fn advance(&mut self, input: StageInput) -> StageProgress {
        let accepted = match (self.stage.clone(), input) {
            (
                EnrollmentStage::Typing { attempt },
                StageInput::TypingAttempt {
                    transcript,
                    keystrokes,
                },
            ) => self.accept_typing_attempt(attempt, &transcript, keystrokes),
            (EnrollmentStage::Swipe, StageInput::Swipe(gesture)) => self.accept_swipe(&gesture),
            (EnrollmentStage::Tap, StageInput::ArmTapTarget { x, y }) => {
                self.armed_target = Some(ArmedTarget {
                    x,
                    y,
                    armed_at: Utc::now(),
                });
                true
            }
            (EnrollmentStage::Tap, StageInput::Tap { x, y }) => self.accept_tap(x, y),
            (EnrollmentStage::Motion, StageInput::MotionHoldComplete) => {
                self.motion_window = Some(self.sampler.stop());
                self.stage = EnrollmentStage::Submitting;
                true
            }
            (stage, input) => {
                tracing::debug!("ignoring {input:?} in {stage} stage");
                false
            }
        };

        StageProgress {
            stage: self.stage.clone(),
            accepted,
        }
    }

    fn accept_typing_attempt(
        &mut self,
        attempt: usize,
        transcript: &str,
        keystrokes: Vec<KeystrokeEvent>,
    ) -> bool {
        if !transcript.trim().eq_ignore_ascii_case(REFERENCE_SENTENCE) {
            return false;
        }

        self.typing_attempts.push(keystrokes);
        // The per-attempt motion window is not part of the payload.
        let _ = self.sampler.stop();

        self.stage = if attempt < REQUIRED_TYPING_ATTEMPTS {
            EnrollmentStage::Typing {
                attempt: attempt + 1,
            }
        } else {
            EnrollmentStage::Swipe
        };
        true
    }

    fn accept_swipe(&mut self, gesture: &SwipeGesture) -> bool {
        let Some(expected) = DIRECTION_ORDER.get(self.direction_index).copied() else {
            return false;
        };
        if gesture.direction() != expected || gesture.distance() <= MIN_SWIPE_DISTANCE {
            return false;
        }

        self.swipes.push(SwipeSample::from_gesture(gesture));
        self.swipes_for_direction += 1;

        if self.swipes_for_direction >= SWIPES_PER_DIRECTION {
            self.swipes_for_direction = 0;
            self.direction_index += 1;
            if self.direction_index >= DIRECTION_ORDER.len() {
                self.swipe_window = Some(self.sampler.stop());
                self.stage = EnrollmentStage::Tap;
            }
        }
        true
    }

    fn accept_tap(&mut self, x: f64, y: f64) -> bool {
        // No armed target means no active trial; the tap leaves no trace.
        let Some(target) = self.armed_target.take() else {
            return false;
        };

        let now = Utc::now();
        let reaction_ms = (now - target.armed_at).num_milliseconds().max(0) as u64;
        let miss_distance = (x - target.x).hypot(y - target.y);

        self.taps.push(TapSample {
            target_x: target.x,
            target_y: target.y,
            tap_x: x,
            tap_y: y,
            reaction_ms,
            miss_distance,
            timestamp: now,
        });

        if self.taps.len() >= TAP_TARGET_COUNT {
            self.tap_window = Some(self.sampler.stop());
            self.stage = EnrollmentStage::Motion;
        }
        true
    }

    /// Run the motion stage end to end: start the sampler, hold for
    /// [`MOTION_HOLD`], then close the window.
    pub async fn run_motion_hold(&mut self) -> StageProgress {
        if self.stage != EnrollmentStage::Motion {
            return StageProgress {
                stage: self.stage.clone(),
                accepted: false,
            };
        }
        self.begin_capture();
        tokio::time::sleep(MOTION_HOLD).await;
        self.advance(StageInput::MotionHoldComplete)
    }

    /// Assemble and submit the enrollment payload exactly once.
    ///
    /// Success moves to `Complete`, any failure to `Failed`; either way the
    /// payload is retained and repeat calls are no-ops.
    pub async fn submit(&mut self) -> &EnrollmentStage {
        if self.stage != EnrollmentStage::Submitting {
            return &self.stage;
        }

        let payload = self.assemble_payload();
        tracing::info!(
            subject_id = %payload.user_id,
            "submitting enrollment payload"
        );
        self.payload = Some(payload);

        let accepted = match &self.payload {
            Some(payload) => self.client.submit_enrollment(payload).await,
            None => false,
        };

        self.stage = if accepted {
            EnrollmentStage::Complete
        } else {
            tracing::warn!("enrollment submission rejected, payload retained");
            EnrollmentStage::Failed
        };
        &self.stage
    }

    fn assemble_payload(&mut self) -> EnrollmentPayload {
        EnrollmentPayload {
            user_id: self.subject_id.clone(),
            typing_data: TypingData {
                attempts: std::mem::take(&mut self.typing_attempts),
            },
            swipe_data: SwipeData {
                swipes: std::mem::take(&mut self.swipes),
                sensor_data: self.swipe_window.take().unwrap_or_else(SensorWindow::empty),
            },
            tap_data: TapData {
                taps: std::mem::take(&mut self.taps),
                sensor_data: self.tap_window.take().unwrap_or_else(SensorWindow::empty),
            },
            motion_data: MotionData {
                sensor_data: self
                    .motion_window
                    .take()
                    .unwrap_or_else(SensorWindow::empty),
                duration: MOTION_HOLD.as_secs(),
            },
            context: EnrollmentContext {
                location: self.probe.get_location(),
                timestamp: Utc::now(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::VerifierConfig;
    use crate::sampler::{DeniedLocationCapability, NoopMotionCapability};

    fn aggregator() -> EnrollmentAggregator {
        let sampler = MotionSampler::new(Arc::new(NoopMotionCapability));
        let probe = LocationProbe::new(Arc::new(DeniedLocationCapability));
        // Unroutable verifier; only the submit tests reach the network.
        let client = Arc::new(VerifierClient::new(VerifierConfig::new(
            "http://127.0.0.1:9",
        )));
        EnrollmentAggregator::new("user-test", sampler, probe, client)
    }

    fn valid_attempt() -> StageInput {
        StageInput::TypingAttempt {
            transcript: REFERENCE_SENTENCE.to_string(),
            keystrokes: Vec::new(),
        }
    }

    fn gesture_toward(direction: SwipeDirection) -> SwipeGesture {
        let (end_x, end_y) = match direction {
            SwipeDirection::Right => (300.0, 210.0),
            SwipeDirection::Left => (100.0, 190.0),
            SwipeDirection::Down => (210.0, 300.0),
            SwipeDirection::Up => (190.0, 100.0),
        };
        SwipeGesture {
            start_x: 200.0,
            start_y: 200.0,
            end_x,
            end_y,
            duration_ms: 180,
        }
    }

    fn drive_to_swipe(agg: &mut EnrollmentAggregator) {
        agg.advance(valid_attempt());
        agg.advance(valid_attempt());
        assert_eq!(*agg.stage(), EnrollmentStage::Swipe);
    }

    fn drive_to_tap(agg: &mut EnrollmentAggregator) {
        drive_to_swipe(agg);
        for direction in DIRECTION_ORDER {
            for _ in 0..SWIPES_PER_DIRECTION {
                let progress = agg.advance(StageInput::Swipe(gesture_toward(direction)));
                assert!(progress.accepted);
            }
        }
        assert_eq!(*agg.stage(), EnrollmentStage::Tap);
    }

    fn drive_to_submitting(agg: &mut EnrollmentAggregator) {
        drive_to_tap(agg);
        for i in 0..TAP_TARGET_COUNT {
            agg.advance(StageInput::ArmTapTarget {
                x: 100.0 + i as f64,
                y: 200.0,
            });
            agg.advance(StageInput::Tap {
                x: 105.0 + i as f64,
                y: 203.0,
            });
        }
        assert_eq!(*agg.stage(), EnrollmentStage::Motion);
        agg.advance(StageInput::MotionHoldComplete);
        assert_eq!(*agg.stage(), EnrollmentStage::Submitting);
    }

    #[test]
    fn test_typing_mismatch_rejected() {
        let mut agg = aggregator();
        let progress = agg.advance(StageInput::TypingAttempt {
            transcript: "The quick brown fox".to_string(),
            keystrokes: Vec::new(),
        });
        assert!(!progress.accepted);
        assert_eq!(progress.stage, EnrollmentStage::Typing { attempt: 1 });
        assert!(agg.typing_attempts().is_empty());
    }

    #[test]
    fn test_typing_match_is_case_insensitive() {
        let mut agg = aggregator();
        let progress = agg.advance(StageInput::TypingAttempt {
            transcript: "the QUICK brown fox jumps over the lazy dog".to_string(),
            keystrokes: Vec::new(),
        });
        assert!(progress.accepted);
        assert_eq!(progress.stage, EnrollmentStage::Typing { attempt: 2 });
    }

    #[test]
    fn test_two_attempts_reach_swipe() {
        let mut agg = aggregator();
        drive_to_swipe(&mut agg);
        assert_eq!(agg.typing_attempts().len(), 2);
        assert_eq!(agg.expected_direction(), Some(SwipeDirection::Right));
    }

    #[test]
    fn test_swipe_rejections_leave_no_trace() {
        let mut agg = aggregator();
        drive_to_swipe(&mut agg);

        // Wrong direction.
        let progress = agg.advance(StageInput::Swipe(gesture_toward(SwipeDirection::Left)));
        assert!(!progress.accepted);

        // Right direction, insufficient displacement.
        let short = SwipeGesture {
            start_x: 200.0,
            start_y: 200.0,
            end_x: 240.0,
            end_y: 200.0,
            duration_ms: 100,
        };
        let progress = agg.advance(StageInput::Swipe(short));
        assert!(!progress.accepted);

        assert!(agg.swipe_samples().is_empty());
        assert_eq!(*agg.stage(), EnrollmentStage::Swipe);
    }

    #[test]
    fn test_direction_cycle_and_stage_exit() {
        let mut agg = aggregator();
        drive_to_swipe(&mut agg);

        let mut fed = 0;
        for direction in DIRECTION_ORDER {
            for _ in 0..SWIPES_PER_DIRECTION {
                fed += 1;
                let progress = agg.advance(StageInput::Swipe(gesture_toward(direction)));
                assert!(progress.accepted, "swipe {fed} should be accepted");
                if fed < DIRECTION_ORDER.len() * SWIPES_PER_DIRECTION {
                    assert_eq!(progress.stage, EnrollmentStage::Swipe);
                }
            }
        }
        assert_eq!(*agg.stage(), EnrollmentStage::Tap);
        assert_eq!(agg.swipe_samples().len(), 12);
    }

    #[test]
    fn test_one_fewer_swipe_stays_in_swipe() {
        let mut agg = aggregator();
        drive_to_swipe(&mut agg);

        for direction in [
            SwipeDirection::Right,
            SwipeDirection::Down,
            SwipeDirection::Left,
        ] {
            for _ in 0..SWIPES_PER_DIRECTION {
                agg.advance(StageInput::Swipe(gesture_toward(direction)));
            }
        }
        agg.advance(StageInput::Swipe(gesture_toward(SwipeDirection::Up)));
        agg.advance(StageInput::Swipe(gesture_toward(SwipeDirection::Up)));

        assert_eq!(*agg.stage(), EnrollmentStage::Swipe);
        assert_eq!(agg.swipe_samples().len(), 11);
    }

    #[test]
    fn test_tap_without_armed_target_ignored() {
        let mut agg = aggregator();
        drive_to_tap(&mut agg);

        let progress = agg.advance(StageInput::Tap { x: 50.0, y: 50.0 });
        assert!(!progress.accepted);
        assert!(agg.tap_samples().is_empty());
    }

    #[test]
    fn test_arming_is_consumed_by_one_tap() {
        let mut agg = aggregator();
        drive_to_tap(&mut agg);

        agg.advance(StageInput::ArmTapTarget { x: 100.0, y: 100.0 });
        assert!(agg.advance(StageInput::Tap { x: 102.0, y: 101.0 }).accepted);
        assert!(!agg.advance(StageInput::Tap { x: 102.0, y: 101.0 }).accepted);

        assert_eq!(agg.tap_samples().len(), 1);
        let tap = &agg.tap_samples()[0];
        assert!((tap.miss_distance - (2.0_f64).hypot(1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_ten_taps_reach_motion() {
        let mut agg = aggregator();
        drive_to_submitting(&mut agg);
        assert_eq!(agg.tap_samples().len(), TAP_TARGET_COUNT);
    }

    #[test]
    fn test_wrong_stage_input_rejected() {
        let mut agg = aggregator();
        let progress = agg.advance(StageInput::Swipe(gesture_toward(SwipeDirection::Right)));
        assert!(!progress.accepted);
        assert_eq!(progress.stage, EnrollmentStage::Typing { attempt: 1 });
        assert!(agg.swipe_samples().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_retains_payload() {
        let mut agg = aggregator();
        drive_to_submitting(&mut agg);

        let stage = agg.submit().await.clone();
        assert_eq!(stage, EnrollmentStage::Failed);

        let payload = agg.payload().expect("payload retained on failure");
        assert_eq!(payload.user_id, "user-test");
        assert_eq!(payload.typing_data.attempts.len(), 2);
        assert_eq!(payload.swipe_data.swipes.len(), 12);
        assert_eq!(payload.tap_data.taps.len(), 10);
        assert_eq!(payload.motion_data.duration, MOTION_HOLD.as_secs());
    }

    #[tokio::test]
    async fn test_submit_is_exactly_once() {
        let mut agg = aggregator();
        drive_to_submitting(&mut agg);

        agg.submit().await;
        let stage = agg.submit().await.clone();
        assert_eq!(stage, EnrollmentStage::Failed);
    }

    #[tokio::test]
    async fn test_submit_before_submitting_stage_is_noop() {
        let mut agg = aggregator();
        let stage = agg.submit().await.clone();
        assert_eq!(stage, EnrollmentStage::Typing { attempt: 1 });
        assert!(agg.payload().is_none());
    }
}
