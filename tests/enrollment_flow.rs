//! End-to-end enrollment tests against an in-process mock verifier.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use bioauth_agent::api::{VerifierClient, VerifierConfig};
use bioauth_agent::enrollment::{
    EnrollmentAggregator, EnrollmentStage, StageInput, SwipeGesture, DIRECTION_ORDER,
    REFERENCE_SENTENCE, SWIPES_PER_DIRECTION, TAP_TARGET_COUNT,
};
use bioauth_agent::sampler::{
    DeniedLocationCapability, LocationProbe, MotionSampler, NoopMotionCapability,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
struct MockVerifier {
    enrollments: Mutex<Vec<serde_json::Value>>,
}

async fn accept_enrollment(
    State(state): State<Arc<MockVerifier>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    state.enrollments.lock().unwrap().push(body);
    Json(serde_json::json!({ "message": "Training data saved" }))
}

async fn reject_enrollment() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_verifier(accept: bool) -> (SocketAddr, Arc<MockVerifier>) {
    let state = Arc::new(MockVerifier::default());

    let app = if accept {
        Router::new()
            .route("/enrollment", post(accept_enrollment))
            .with_state(Arc::clone(&state))
    } else {
        Router::new().route("/enrollment", post(reject_enrollment))
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn aggregator_for(addr: SocketAddr) -> EnrollmentAggregator {
    let client = Arc::new(VerifierClient::new(VerifierConfig::new(format!(
        "http://{addr}"
    ))));
    let sampler = MotionSampler::new(Arc::new(NoopMotionCapability));
    let probe = LocationProbe::new(Arc::new(DeniedLocationCapability));
    EnrollmentAggregator::new("user-e2e", sampler, probe, client)
}

fn gesture_toward(direction: bioauth_agent::enrollment::SwipeDirection) -> SwipeGesture {
    use bioauth_agent::enrollment::SwipeDirection;
    let (end_x, end_y) = match direction {
        SwipeDirection::Right => (350.0, 400.0),
        SwipeDirection::Left => (50.0, 400.0),
        SwipeDirection::Down => (200.0, 600.0),
        SwipeDirection::Up => (200.0, 200.0),
    };
    SwipeGesture {
        start_x: 200.0,
        start_y: 400.0,
        end_x,
        end_y,
        duration_ms: 150,
    }
}

/// Feed exactly the required capture counts and leave the aggregator in
/// `Submitting`.
fn drive_to_submitting(aggregator: &mut EnrollmentAggregator) {
    for _ in 0..2 {
        aggregator.begin_capture();
        let progress = aggregator.advance(StageInput::TypingAttempt {
            transcript: REFERENCE_SENTENCE.to_string(),
            keystrokes: Vec::new(),
        });
        assert!(progress.accepted);
    }
    assert_eq!(*aggregator.stage(), EnrollmentStage::Swipe);

    aggregator.begin_capture();
    for direction in DIRECTION_ORDER {
        for _ in 0..SWIPES_PER_DIRECTION {
            assert!(
                aggregator
                    .advance(StageInput::Swipe(gesture_toward(direction)))
                    .accepted
            );
        }
    }
    assert_eq!(*aggregator.stage(), EnrollmentStage::Tap);

    aggregator.begin_capture();
    for _ in 0..TAP_TARGET_COUNT {
        aggregator.advance(StageInput::ArmTapTarget { x: 150.0, y: 300.0 });
        assert!(
            aggregator
                .advance(StageInput::Tap { x: 155.0, y: 296.0 })
                .accepted
        );
    }
    assert_eq!(*aggregator.stage(), EnrollmentStage::Motion);

    aggregator.begin_capture();
    aggregator.advance(StageInput::MotionHoldComplete);
    assert_eq!(*aggregator.stage(), EnrollmentStage::Submitting);
}

#[tokio::test]
async fn test_full_enrollment_reaches_complete() {
    let (addr, verifier) = spawn_verifier(true).await;
    let mut aggregator = aggregator_for(addr);

    drive_to_submitting(&mut aggregator);
    let stage = aggregator.submit().await.clone();
    assert_eq!(stage, EnrollmentStage::Complete);

    let enrollments = verifier.enrollments.lock().unwrap();
    assert_eq!(enrollments.len(), 1);

    let payload = &enrollments[0];
    assert_eq!(payload["userId"], "user-e2e");
    assert_eq!(payload["typingData"]["attempts"].as_array().unwrap().len(), 2);
    assert_eq!(payload["swipeData"]["swipes"].as_array().unwrap().len(), 12);
    assert_eq!(payload["tapData"]["taps"].as_array().unwrap().len(), 10);
    assert_eq!(payload["motionData"]["duration"], 10);
    // Location permission denied degrades to a null context entry.
    assert!(payload["context"]["location"].is_null());
    assert!(payload["context"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_rejected_submission_fails_with_payload_retained() {
    let (addr, _verifier) = spawn_verifier(false).await;
    let mut aggregator = aggregator_for(addr);

    drive_to_submitting(&mut aggregator);
    let stage = aggregator.submit().await.clone();
    assert_eq!(stage, EnrollmentStage::Failed);

    let payload = aggregator.payload().expect("payload retained");
    assert_eq!(payload.swipe_data.swipes.len(), 12);
}

#[tokio::test]
async fn test_submission_is_sent_exactly_once() {
    let (addr, verifier) = spawn_verifier(true).await;
    let mut aggregator = aggregator_for(addr);

    drive_to_submitting(&mut aggregator);
    aggregator.submit().await;
    aggregator.submit().await;

    assert_eq!(verifier.enrollments.lock().unwrap().len(), 1);
}
