//! The continuous-authentication monitoring loop.
//!
//! While monitoring, the UI layer records touch events and the motion sampler
//! runs in the background. A repeating timer assembles an evidence window
//! each tick, sends it to the remote verifier, and tears the session down
//! through the anomaly callback when the verdict flags one.

use crate::api::{AuthContext, AuthPayload, VerifierClient};
use crate::monitor::touch::{TouchEvent, TouchEventBuffer};
use crate::sampler::{LocationProbe, MotionSampler};
use chrono::{DateTime, Local, Timelike, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default period between authentication checks.
pub const AUTH_TICK_INTERVAL: Duration = Duration::from_secs(10);

/// Monitor tuning. The default tick interval must comfortably exceed the
/// verifier round-trip time; overlapping ticks are dropped either way.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub tick_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: AUTH_TICK_INTERVAL,
        }
    }
}

type AnomalyCallback = Arc<dyn Fn() + Send + Sync>;

struct SessionState {
    subject_id: String,
    on_anomaly: AnomalyCallback,
    timer: JoinHandle<()>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: Arc<VerifierClient>,
    probe: LocationProbe,
    sampler: Mutex<MotionSampler>,
    touch: Mutex<TouchEventBuffer>,
    session: Mutex<Option<SessionState>>,
    tick_in_flight: AtomicBool,
}

/// Orchestrates touch buffering, motion sampling and the periodic verifier
/// round trip for one monitoring session at a time.
///
/// Cheap to clone via the inner `Arc`; all methods take `&self`. `start()`
/// must be called from within a tokio runtime.
#[derive(Clone)]
pub struct ContinuousAuthMonitor {
    inner: Arc<MonitorInner>,
}

impl ContinuousAuthMonitor {
    pub fn new(client: Arc<VerifierClient>, sampler: MotionSampler, probe: LocationProbe) -> Self {
        Self::with_config(MonitorConfig::default(), client, sampler, probe)
    }

    pub fn with_config(
        config: MonitorConfig,
        client: Arc<VerifierClient>,
        sampler: MotionSampler,
        probe: LocationProbe,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                config,
                client,
                probe,
                sampler: Mutex::new(sampler),
                touch: Mutex::new(TouchEventBuffer::new()),
                session: Mutex::new(None),
                tick_in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Begin monitoring for `subject_id`. No-op when already monitoring (no
    /// duplicate timers or subscriptions). `on_anomaly` is invoked at most
    /// once per session, after the monitor has already torn itself down.
    pub fn start(&self, subject_id: impl Into<String>, on_anomaly: impl Fn() + Send + Sync + 'static) {
        let mut session = self.inner.session.lock().expect("lock poisoned");
        if session.is_some() {
            tracing::debug!("monitor already active, ignoring start");
            return;
        }

        let subject_id = subject_id.into();
        self.inner.touch.lock().expect("lock poisoned").clear();
        self.inner.tick_in_flight.store(false, Ordering::SeqCst);
        if let Err(e) = self
            .inner
            .sampler
            .lock()
            .expect("lock poisoned")
            .start()
        {
            tracing::warn!("motion capture unavailable during monitoring: {e}");
        }

        let inner = Arc::clone(&self.inner);
        let interval = self.inner.config.tick_interval;
        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The immediate first tick: the first evidence window should
            // cover a full period.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                MonitorInner::run_tick(&inner).await;
            }
        });

        tracing::info!(subject_id = %subject_id, "continuous monitoring started");
        *session = Some(SessionState {
            subject_id,
            on_anomaly: Arc::new(on_anomaly),
            timer,
        });
    }

    /// Stop monitoring: cancel the timer, stop the sampler, clear buffers.
    /// Idempotent and safe to call from teardown paths even if never started.
    pub fn stop(&self) {
        if MonitorInner::teardown(&self.inner) {
            tracing::info!("continuous monitoring stopped");
        }
    }

    /// Record a touch interaction. Appends only while monitoring is active.
    pub fn record(&self, event: TouchEvent) {
        if self.inner.session.lock().expect("lock poisoned").is_none() {
            return;
        }
        self.inner.touch.lock().expect("lock poisoned").push(event);
    }

    pub fn is_active(&self) -> bool {
        self.inner.session.lock().expect("lock poisoned").is_some()
    }

    /// Number of touch events currently buffered.
    pub fn buffered_events(&self) -> usize {
        self.inner.touch.lock().expect("lock poisoned").len()
    }
}

impl MonitorInner {
    /// Tear the session down. Returns whether a session was active.
    fn teardown(inner: &Arc<MonitorInner>) -> bool {
        let taken = inner.session.lock().expect("lock poisoned").take();
        let Some(session) = taken else {
            return false;
        };

        session.timer.abort();
        let _ = inner.sampler.lock().expect("lock poisoned").stop();
        inner.touch.lock().expect("lock poisoned").clear();
        // A tick aborted mid-await never resets its own guard.
        inner.tick_in_flight.store(false, Ordering::SeqCst);
        true
    }

    async fn run_tick(inner: &Arc<MonitorInner>) {
        if inner.session.lock().expect("lock poisoned").is_none() {
            return;
        }
        if inner.tick_in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("previous tick still in flight, dropping this tick");
            return;
        }

        // Snapshot first; recording stays possible during the awaits below.
        let touch_events = inner.touch.lock().expect("lock poisoned").snapshot();
        if touch_events.is_empty() {
            // Empty evidence window: no request, no clear.
            inner.tick_in_flight.store(false, Ordering::SeqCst);
            return;
        }

        let subject_id = match inner.session.lock().expect("lock poisoned").as_ref() {
            Some(session) => session.subject_id.clone(),
            None => {
                inner.tick_in_flight.store(false, Ordering::SeqCst);
                return;
            }
        };

        let location = inner.probe.get_location();
        let motion_data = inner.sampler.lock().expect("lock poisoned").peek();

        let payload = AuthPayload {
            user_id: subject_id,
            touch_events,
            motion_data,
            context: AuthContext {
                location,
                timestamp: Utc::now(),
                time_of_day: time_of_day_label(&Local::now()),
            },
        };

        tracing::debug!(
            touch_events = payload.touch_events.len(),
            motion_samples = payload.motion_data.sample_count(),
            "sending continuous-auth evidence window"
        );
        let response = inner.client.continuous_auth(&payload).await;

        // Evidence windows never straddle ticks: clear regardless of verdict,
        // and only after the snapshot above was taken.
        inner.touch.lock().expect("lock poisoned").clear();
        inner.sampler.lock().expect("lock poisoned").clear();
        inner.tick_in_flight.store(false, Ordering::SeqCst);

        if response.anomaly {
            // A verdict landing after stop() is silently ignored; teardown
            // only succeeds for the session that sent this window.
            let callback = inner
                .session
                .lock()
                .expect("lock poisoned")
                .as_ref()
                .map(|session| Arc::clone(&session.on_anomaly));
            if Self::teardown(inner) {
                tracing::warn!(
                    confidence = response.confidence,
                    "anomaly verdict received, session locked out"
                );
                if let Some(callback) = callback {
                    callback();
                }
            }
        }
    }
}

/// Wall-clock time-of-day label, `"H:M"` without zero padding.
fn time_of_day_label(now: &DateTime<Local>) -> String {
    format!("{}:{}", now.hour(), now.minute())
}
