//! Run and session score totals plus the eased on-screen counter.
use serde::{Deserialize, Serialize};

use crate::numbers::{clamp_f64_to_f32, floor_f64_to_u64, u64_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScoreRecord {
    /// Score earned in the current level attempt.
    pub total_run_score: u64,
    /// Score accumulated across every completed and current level.
    pub session_total_score: u64,
}

impl ScoreRecord {
    pub fn add(&mut self, points: u64) {
        self.total_run_score = self.total_run_score.saturating_add(points);
        self.session_total_score = self.session_total_score.saturating_add(points);
    }

    /// Drop the current attempt's points from both totals.
    pub fn abandon_run(&mut self) {
        self.session_total_score = self
            .session_total_score
            .saturating_sub(self.total_run_score);
        self.total_run_score = 0;
    }

    /// Start a new level while keeping the session total.
    pub fn start_run(&mut self) {
        self.total_run_score = 0;
    }
}

/// Counter that eases toward the real score for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreDisplay {
    displayed: f64,
}

impl ScoreDisplay {
    /// Move toward `target` by `min(1, dt * rate)` of the remaining gap,
    /// snapping once within one point.
    pub fn update(&mut self, target: u64, dt_secs: f32, rate: f32) {
        let target = u64_to_f64(target);
        let step = f64::from((dt_secs.max(0.0) * rate).min(1.0));
        self.displayed += (target - self.displayed) * step;
        if (target - self.displayed).abs() < 1.0 {
            self.displayed = target;
        }
    }

    pub fn snap(&mut self, target: u64) {
        self.displayed = u64_to_f64(target);
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        floor_f64_to_u64(self.displayed)
    }

    /// Fractional display value, for renderers that tween between ticks.
    #[must_use]
    pub fn raw(&self) -> f32 {
        clamp_f64_to_f32(self.displayed)
    }
}
