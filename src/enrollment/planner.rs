//! Scheduling of reaction targets for the tap stage.

use rand::Rng;
use std::time::Duration;

/// Rendered target diameter in px; positions keep this margin from the edges.
pub const TARGET_SIZE: f64 = 80.0;

/// Inter-target delay bounds (uniformly distributed).
pub const MIN_TARGET_DELAY: Duration = Duration::from_millis(1000);
pub const MAX_TARGET_DELAY: Duration = Duration::from_millis(3000);

/// One planned reaction target: where its center goes and how long to wait
/// before showing it.
#[derive(Debug, Clone, Copy)]
pub struct PlannedTarget {
    pub center_x: f64,
    pub center_y: f64,
    pub delay: Duration,
}

/// Plans random target positions and delays within the screen bounds.
#[derive(Debug, Clone)]
pub struct TapTargetPlanner {
    width: f64,
    height: f64,
}

impl TapTargetPlanner {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn next_target(&self) -> PlannedTarget {
        let mut rng = rand::rng();

        let margin = TARGET_SIZE;
        let x_span = (self.width - 2.0 * margin - TARGET_SIZE).max(1.0);
        // Keep targets clear of the header and bottom edge.
        let y_span = (self.height - 300.0 - TARGET_SIZE).max(1.0);

        let x = rng.random_range(0.0..x_span) + margin;
        let y = rng.random_range(0.0..y_span) + 150.0;

        let delay_ms =
            rng.random_range(MIN_TARGET_DELAY.as_millis()..MAX_TARGET_DELAY.as_millis()) as u64;

        PlannedTarget {
            center_x: x + TARGET_SIZE / 2.0,
            center_y: y + TARGET_SIZE / 2.0,
            delay: Duration::from_millis(delay_ms),
        }
    }
}
