//! Frame-time budget statistics.
//!
//! Hosts time each frame and feed the durations here; the report tells
//! whether a widget fits the 60 fps budget.

use serde::{Deserialize, Serialize};

/// One display frame at 60 Hz, in milliseconds.
pub const FRAME_BUDGET_MS: f64 = 1000.0 / 60.0;

/// Summary of measured frame durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameBudget {
    pub widget: String,
    pub frames: usize,
    pub mean_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
    /// Frames that took longer than [`FRAME_BUDGET_MS`].
    pub over_budget: usize,
}

impl FrameBudget {
    /// Summarise `durations_ms`. Non-finite samples are discarded.
    pub fn from_durations(widget: &str, durations_ms: &[f64]) -> Self {
        let mut sorted: Vec<f64> = durations_ms
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .collect();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let (mean_ms, p95_ms, max_ms) = if n == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let mean = sorted.iter().sum::<f64>() / n as f64;
            // Nearest-rank percentile.
            let rank = ((0.95 * n as f64).ceil() as usize).clamp(1, n);
            (mean, sorted[rank - 1], sorted[n - 1])
        };

        Self {
            widget: widget.to_string(),
            frames: n,
            mean_ms,
            p95_ms,
            max_ms,
            over_budget: sorted.iter().filter(|&&d| d > FRAME_BUDGET_MS).count(),
        }
    }

    /// True when the 95th percentile fits in one frame.
    pub fn within_budget(&self) -> bool {
        self.p95_ms <= FRAME_BUDGET_MS
    }
}
