//! Remote verifier client and the payload types it ships.
//!
//! The verifier accepts one enrollment submission per session and a stream of
//! continuous-auth evidence windows. Callers of the public methods never see
//! an error: transport failures, timeouts and non-2xx responses all degrade
//! to fail-open defaults so a flaky network cannot cause a spurious lockout.

use crate::enrollment::types::{KeystrokeEvent, SwipeSample, TapSample};
use crate::monitor::touch::TouchEvent;
use crate::sampler::types::{LocationFix, SensorWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verifier endpoint configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Base URL, e.g. `http://192.168.1.10:3001`
    pub base_url: String,
}

impl VerifierConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn enrollment_url(&self) -> String {
        format!("{}/enrollment", self.base_url)
    }

    pub fn authenticate_url(&self) -> String {
        format!("{}/authenticate", self.base_url)
    }

    pub fn continuous_auth_url(&self) -> String {
        format!("{}/continuous-auth", self.base_url)
    }
}

/// Verifier call error taxonomy. Internal only: the public client methods
/// translate these into fail-open results.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Verifier network error: {0}")]
    Network(String),

    #[error("Verifier server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Verifier response error: {0}")]
    Serialization(String),
}

/// Both typing attempts, each an ordered keystroke sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingData {
    pub attempts: Vec<Vec<KeystrokeEvent>>,
}

/// Accepted swipes plus the motion window recorded during the stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeData {
    pub swipes: Vec<SwipeSample>,
    pub sensor_data: SensorWindow,
}

/// Tap trials plus the motion window recorded during the stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapData {
    pub taps: Vec<TapSample>,
    pub sensor_data: SensorWindow,
}

/// The dedicated motion-hold window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionData {
    pub sensor_data: SensorWindow,
    /// Hold duration in seconds
    pub duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentContext {
    pub location: Option<LocationFix>,
    pub timestamp: DateTime<Utc>,
}

/// The full enrollment submission, assembled once at the final stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPayload {
    pub user_id: String,
    pub typing_data: TypingData,
    pub swipe_data: SwipeData,
    pub tap_data: TapData,
    pub motion_data: MotionData,
    pub context: EnrollmentContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub location: Option<LocationFix>,
    pub timestamp: DateTime<Utc>,
    /// Local wall-clock label, `"H:M"`
    pub time_of_day: String,
}

/// One continuous-auth tick's evidence window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user_id: String,
    pub touch_events: Vec<TouchEvent>,
    pub motion_data: SensorWindow,
    pub context: AuthContext,
}

/// Remote verdict for an authentication call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub anomaly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthResponse {
    /// Fail-open default for the one-shot `/authenticate` path.
    fn authenticate_fallback(reason: &VerifierError) -> Self {
        Self {
            anomaly: false,
            authenticated: None,
            confidence: None,
            message: Some(reason.to_string()),
        }
    }

    /// Fail-open default for the periodic `/continuous-auth` path.
    fn continuous_fallback(reason: &VerifierError) -> Self {
        Self {
            anomaly: false,
            authenticated: Some(true),
            confidence: None,
            message: Some(reason.to_string()),
        }
    }
}

/// HTTP client for the remote verifier.
pub struct VerifierClient {
    config: VerifierConfig,
    client: reqwest::Client,
}

impl VerifierClient {
    pub fn new(config: VerifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    /// Probe the verifier base URL. Used before starting a session.
    pub async fn test_connection(&self) -> bool {
        match self.client.get(&self.config.base_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("verifier connection probe failed: {e}");
                false
            }
        }
    }

    /// Submit the enrollment payload. Any 2xx counts as accepted.
    pub async fn submit_enrollment(&self, payload: &EnrollmentPayload) -> bool {
        match self.post_accepted(&self.config.enrollment_url(), payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("enrollment submission failed: {e}");
                false
            }
        }
    }

    /// One-shot authentication. Fails open to a non-anomalous verdict.
    pub async fn authenticate(&self, payload: &AuthPayload) -> AuthResponse {
        match self
            .post_verdict(&self.config.authenticate_url(), payload)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("authenticate call failed, failing open: {e}");
                AuthResponse::authenticate_fallback(&e)
            }
        }
    }

    /// Periodic continuous-auth check. Fails open to an authenticated,
    /// non-anomalous verdict so a flaky network never triggers a lockout.
    pub async fn continuous_auth(&self, payload: &AuthPayload) -> AuthResponse {
        match self
            .post_verdict(&self.config.continuous_auth_url(), payload)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("continuous-auth call failed, failing open: {e}");
                AuthResponse::continuous_fallback(&e)
            }
        }
    }

    async fn post_accepted<T: Serialize>(&self, url: &str, body: &T) -> Result<(), VerifierError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| VerifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VerifierError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn post_verdict<T: Serialize>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<AuthResponse, VerifierError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| VerifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VerifierError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<AuthResponse>()
            .await
            .map_err(|e| VerifierError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::types::SensorWindow;

    fn empty_auth_payload() -> AuthPayload {
        AuthPayload {
            user_id: "user-test".to_string(),
            touch_events: Vec::new(),
            motion_data: SensorWindow::empty(),
            context: AuthContext {
                location: None,
                timestamp: Utc::now(),
                time_of_day: "9:41".to_string(),
            },
        }
    }

    #[test]
    fn test_config_urls() {
        let config = VerifierConfig::new("http://127.0.0.1:3001/");
        assert_eq!(config.enrollment_url(), "http://127.0.0.1:3001/enrollment");
        assert_eq!(
            config.authenticate_url(),
            "http://127.0.0.1:3001/authenticate"
        );
        assert_eq!(
            config.continuous_auth_url(),
            "http://127.0.0.1:3001/continuous-auth"
        );
    }

    #[test]
    fn test_auth_payload_wire_names() {
        let json = serde_json::to_value(empty_auth_payload()).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("touchEvents").is_some());
        assert!(json.get("motionData").is_some());
        assert_eq!(json["context"]["timeOfDay"], "9:41");
    }

    #[test]
    fn test_auth_response_tolerates_sparse_body() {
        let response: AuthResponse = serde_json::from_str(r#"{"anomaly": true}"#).unwrap();
        assert!(response.anomaly);
        assert!(response.authenticated.is_none());
        assert!(response.confidence.is_none());
    }

    // Port 9 (discard) is unassigned on loopback in the test environment, so
    // these exercise the transport-failure path.
    #[tokio::test]
    async fn test_authenticate_fails_open_on_network_error() {
        let client = VerifierClient::new(VerifierConfig::new("http://127.0.0.1:9"));
        let response = client.authenticate(&empty_auth_payload()).await;
        assert!(!response.anomaly);
    }

    #[tokio::test]
    async fn test_continuous_auth_fails_open_on_network_error() {
        let client = VerifierClient::new(VerifierConfig::new("http://127.0.0.1:9"));
        let response = client.continuous_auth(&empty_auth_payload()).await;
        assert!(!response.anomaly);
        assert_eq!(response.authenticated, Some(true));
    }
}
