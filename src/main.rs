//! Bioauth Agent CLI
//!
//! Runs the capture subsystem against synthetic device capabilities, mostly
//! for exercising a verifier backend during development.

use bioauth_agent::api::{VerifierClient, VerifierConfig};
use bioauth_agent::config::Config;
use bioauth_agent::enrollment::{
    EnrollmentAggregator, EnrollmentStage, KeystrokeEvent, StageInput, SwipeDirection,
    SwipeGesture, TapTargetPlanner, DIRECTION_ORDER, REFERENCE_SENTENCE, SWIPES_PER_DIRECTION,
    TAP_TARGET_COUNT,
};
use bioauth_agent::monitor::{ContinuousAuthMonitor, MonitorConfig, TouchEvent, TouchKind};
use bioauth_agent::sampler::{
    FixedLocationCapability, LocationProbe, MotionSampler, SyntheticMotionCapability,
};
use bioauth_agent::VERSION;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bioauth")]
#[command(version = VERSION)]
#[command(about = "Behavioral biometric capture and continuous-authentication agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run continuous monitoring with synthetic touch/motion input
    Monitor {
        /// Verifier base URL (defaults to the configured one)
        #[arg(long)]
        url: Option<String>,

        /// Subject id (generated when omitted)
        #[arg(long)]
        subject: Option<String>,

        /// Seconds between authentication checks
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Drive a full scripted enrollment session against the verifier
    EnrollDemo {
        /// Verifier base URL (defaults to the configured one)
        #[arg(long)]
        url: Option<String>,

        /// Subject id (generated when omitted)
        #[arg(long)]
        subject: Option<String>,
    },

    /// Show effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Monitor {
            url,
            subject,
            interval,
        } => cmd_monitor(config, url, subject, interval).await,
        Commands::EnrollDemo { url, subject } => cmd_enroll_demo(config, url, subject).await,
        Commands::Config => cmd_config(config),
    }
}

fn subject_or_generated(subject: Option<String>) -> String {
    subject.unwrap_or_else(|| format!("user-{}", &uuid::Uuid::new_v4().to_string()[..8]))
}

fn client_for(config: &Config, url: Option<String>) -> Arc<VerifierClient> {
    let base_url = url.unwrap_or_else(|| config.verifier_url.clone());
    Arc::new(VerifierClient::new(VerifierConfig::new(base_url)))
}

async fn cmd_monitor(
    config: Config,
    url: Option<String>,
    subject: Option<String>,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    println!("Bioauth Agent v{VERSION}");

    let client = client_for(&config, url);
    if !client.test_connection().await {
        eprintln!("Warning: verifier not reachable, verdicts will fail open");
    }

    let subject_id = subject_or_generated(subject);
    let tick_interval = interval
        .map(Duration::from_secs)
        .unwrap_or(config.tick_interval);

    let sampler = MotionSampler::with_interval(
        Arc::new(SyntheticMotionCapability),
        config.sample_interval,
    );
    let probe = LocationProbe::new(Arc::new(FixedLocationCapability::new(48.1374, 11.5755)));
    let monitor = ContinuousAuthMonitor::with_config(
        MonitorConfig { tick_interval },
        client,
        sampler,
        probe,
    );

    let locked_out = Arc::new(AtomicBool::new(false));
    let lockout_flag = Arc::clone(&locked_out);
    monitor.start(subject_id.as_str(), move || {
        lockout_flag.store(true, Ordering::SeqCst);
    });
    println!(
        "Monitoring {subject_id} every {}s, press Ctrl+C to stop",
        tick_interval.as_secs()
    );

    let stopped = Arc::new(AtomicBool::new(false));
    let ctrlc_flag = Arc::clone(&stopped);
    ctrlc::set_handler(move || {
        ctrlc_flag.store(true, Ordering::SeqCst);
    })?;

    // Synthetic touch activity so the evidence windows are never empty.
    let mut rng = rand::rng();
    while !stopped.load(Ordering::SeqCst) {
        if locked_out.load(Ordering::SeqCst) {
            println!("Anomaly verdict received: session locked out");
            break;
        }
        monitor.record(TouchEvent::new(
            TouchKind::Press,
            rng.random_range(0.0..400.0),
            rng.random_range(0.0..800.0),
        ));
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    monitor.stop();
    println!("Monitoring stopped");
    Ok(())
}

async fn cmd_enroll_demo(
    config: Config,
    url: Option<String>,
    subject: Option<String>,
) -> anyhow::Result<()> {
    println!("Bioauth Agent v{VERSION}");

    let client = client_for(&config, url);
    let subject_id = subject_or_generated(subject);
    let sampler = MotionSampler::with_interval(
        Arc::new(SyntheticMotionCapability),
        config.sample_interval,
    );
    let probe = LocationProbe::new(Arc::new(FixedLocationCapability::new(48.1374, 11.5755)));
    let mut aggregator = EnrollmentAggregator::new(subject_id.as_str(), sampler, probe, client);

    println!("Enrolling {subject_id}");

    // Typing stage: two scripted attempts at the reference sentence.
    for attempt in 1..=2 {
        aggregator.begin_capture();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let progress = aggregator.advance(StageInput::TypingAttempt {
            transcript: REFERENCE_SENTENCE.to_string(),
            keystrokes: scripted_keystrokes(),
        });
        println!("  typing attempt {attempt}: stage now {}", progress.stage);
    }

    // Swipe stage: three clean swipes per direction.
    aggregator.begin_capture();
    for direction in DIRECTION_ORDER {
        for _ in 0..SWIPES_PER_DIRECTION {
            tokio::time::sleep(Duration::from_millis(100)).await;
            aggregator.advance(StageInput::Swipe(scripted_swipe(direction)));
        }
        println!("  swipe {direction}: done");
    }

    // Tap stage: planner-scheduled targets, taps landing near center.
    aggregator.begin_capture();
    let planner = TapTargetPlanner::new(400.0, 800.0);
    let mut rng = rand::rng();
    for i in 1..=TAP_TARGET_COUNT {
        let target = planner.next_target();
        tokio::time::sleep(target.delay.min(Duration::from_millis(100))).await;
        aggregator.advance(StageInput::ArmTapTarget {
            x: target.center_x,
            y: target.center_y,
        });
        aggregator.advance(StageInput::Tap {
            x: target.center_x + rng.random_range(-8.0..8.0),
            y: target.center_y + rng.random_range(-8.0..8.0),
        });
        println!("  tap {i}/{TAP_TARGET_COUNT}");
    }

    println!("  motion hold (10s), keep still...");
    aggregator.run_motion_hold().await;

    let stage = aggregator.submit().await.clone();
    match stage {
        EnrollmentStage::Complete => println!("Enrollment complete"),
        EnrollmentStage::Failed => {
            eprintln!("Enrollment submission failed; assembled payload:");
            if let Some(payload) = aggregator.payload() {
                println!("{}", serde_json::to_string_pretty(payload)?);
            }
        }
        other => eprintln!("Unexpected terminal stage: {other}"),
    }
    Ok(())
}

fn cmd_config(config: Config) -> anyhow::Result<()> {
    println!("Config file: {}", Config::config_path().display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Fabricate a keystroke sequence for the reference sentence with plausible
/// per-key timing.
fn scripted_keystrokes() -> Vec<KeystrokeEvent> {
    let mut rng = rand::rng();
    let mut events = Vec::new();
    let mut previous_release = None;
    let mut cursor = Utc::now();

    for key in REFERENCE_SENTENCE.chars() {
        let press = cursor + chrono::Duration::milliseconds(rng.random_range(60..220));
        let release = press + chrono::Duration::milliseconds(rng.random_range(40..130));
        events.push(KeystrokeEvent::from_times(
            key.to_string(),
            press,
            release,
            previous_release,
        ));
        previous_release = Some(release);
        cursor = release;
    }
    events
}

fn scripted_swipe(direction: SwipeDirection) -> SwipeGesture {
    let mut rng = rand::rng();
    let (dx, dy) = match direction {
        SwipeDirection::Right => (rng.random_range(120.0..220.0), rng.random_range(-20.0..20.0)),
        SwipeDirection::Left => (rng.random_range(-220.0..-120.0), rng.random_range(-20.0..20.0)),
        SwipeDirection::Down => (rng.random_range(-20.0..20.0), rng.random_range(120.0..220.0)),
        SwipeDirection::Up => (rng.random_range(-20.0..20.0), rng.random_range(-220.0..-120.0)),
    };
    SwipeGesture {
        start_x: 200.0,
        start_y: 400.0,
        end_x: 200.0 + dx,
        end_y: 400.0 + dy,
        duration_ms: rng.random_range(120..400),
    }
}
