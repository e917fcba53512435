//! Attention classification and the interaction-level accumulator.
//!
//! [`AttentionTracker`] owns the per-frame interaction level, a scalar in
//! `[1, 10]` describing how engaged the robot currently is: it climbs fast
//! while the user watches and decays slowly otherwise, with a higher floor
//! while a user is still present. A separate engagement *target* is derived
//! from a weighted window of recent attention states plus the active emotion
//! set; the target is exported for telemetry and intensity smoothing and
//! never feeds back into the level step.

use std::collections::VecDeque;

use emobot_types::{AttentionState, EmotionLabel};

/// Frames of weighted attention history feeding the engagement target.
const HISTORY_LEN: usize = 50;

fn attention_weight(state: AttentionState) -> f32 {
    match state {
        AttentionState::Watching => 3.0,
        AttentionState::NotWatching => 1.0,
        AttentionState::NoUser => 0.5,
    }
}

/// Result of one per-frame attention update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementUpdate {
    /// Interaction level after this frame's step, in `[1, 10]`.
    pub level: f32,
    /// Engagement target suggested by recent history, in `[3, 10]`.
    pub target: f32,
}

/// Interaction-level accumulator. One [`AttentionTracker::update`] per frame.
#[derive(Debug)]
pub struct AttentionTracker {
    level: f32,
    history: VecDeque<f32>,
}

impl AttentionTracker {
    /// Start minimally attentive, at the `NoUser` floor.
    pub fn new() -> Self {
        Self {
            level: 1.0,
            history: VecDeque::with_capacity(HISTORY_LEN + 1),
        }
    }

    /// Classify one frame of presence and gaze flags.
    pub fn classify(presence: bool, watching: bool) -> AttentionState {
        if !presence {
            AttentionState::NoUser
        } else if watching {
            AttentionState::Watching
        } else {
            AttentionState::NotWatching
        }
    }

    /// Current interaction level.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Apply one frame's attention state.
    ///
    /// Records the state in the engagement history, recomputes the target,
    /// then steps the level: `Watching` +0.6 capped at 10, `NotWatching`
    /// −0.05 floored at 2, `NoUser` −0.1 floored at 1. A level below a floor
    /// is lifted to it, so regaining a user never leaves the level stuck low.
    pub fn update(&mut self, state: AttentionState, active: &[EmotionLabel]) -> EngagementUpdate {
        self.history.push_back(attention_weight(state));
        if self.history.len() > HISTORY_LEN {
            self.history.pop_front();
        }

        let target = self.engagement_target(active);

        self.level = match state {
            AttentionState::Watching => (self.level + 0.6).min(10.0),
            AttentionState::NotWatching => (self.level - 0.05).max(2.0),
            AttentionState::NoUser => (self.level - 0.1).max(1.0),
        };

        EngagementUpdate {
            level: self.level,
            target,
        }
    }

    /// Weighted-history engagement score times the emotion factor, clamped
    /// to `[3, 10]`.
    fn engagement_target(&self, active: &[EmotionLabel]) -> f32 {
        if self.history.is_empty() {
            return 3.0;
        }
        let sum: f32 = self.history.iter().sum();
        let score = sum / (self.history.len() as f32 * 1.2) * 10.0;

        let mut factor = 1.2;
        if active.contains(&EmotionLabel::Happy) {
            factor += 0.5;
        }
        if active.contains(&EmotionLabel::Surprised) {
            factor += 0.4;
        }
        if active.contains(&EmotionLabel::Interested) {
            factor += 0.4;
        }
        if !active.is_empty() {
            factor += 0.2;
        }

        (score * factor).clamp(3.0, 10.0)
    }
}

impl Default for AttentionTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
