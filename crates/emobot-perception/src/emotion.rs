//! Emotion stabilizer.
//!
//! Raw per-frame scores flap: a detector re-evaluates every frame and a
//! borderline smile flickers between labels at 30 fps. The stabilizer
//! smooths the dominant label with a short consensus buffer so downstream
//! behavior reacts to expressions, not to frame noise.
//!
//! Per [`EmotionStabilizer::update`] call:
//! 1. every score gets symmetric uniform jitter (±[`JITTER`]) and is clamped
//!    back to `[0, 1]`, so exact ties between labels effectively never
//!    survive ranking;
//! 2. the top label is adopted outright when it scores above
//!    [`INSTANT_ACCEPT`]; otherwise the most frequent label of the last
//!    [`HISTORY_LEN`] frames wins if it reached [`CONSENSUS`] occurrences,
//!    and failing that the output holds `Neutral`.
//!
//! A consequence of the consensus rule worth knowing: after an expression
//! stops, its label can persist for up to two frames while it still holds
//! the history majority.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use emobot_types::{EmotionLabel, EmotionScores};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

/// Frames of dominant-label history kept for the consensus rule.
const HISTORY_LEN: usize = 5;
/// Occurrences within the history window needed to adopt a label.
const CONSENSUS: usize = 3;
/// Confidence above which the top label is adopted immediately.
const INSTANT_ACCEPT: f32 = 0.75;
/// Half-width of the uniform jitter applied to every score before ranking.
const JITTER: f32 = 0.01;

/// General activation threshold for the active-emotion set.
const ACTIVE_THRESHOLD: f32 = 0.4;
/// `Interested` fires easily, so it gets a stricter activation threshold.
const INTERESTED_THRESHOLD: f32 = 0.55;

/// Output of one stabilizer update.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionReading {
    /// Stabilized dominant label.
    pub dominant: EmotionLabel,
    /// This frame's (jittered) score of the dominant label.
    pub confidence: f32,
    /// Labels currently active, in ranking order.
    pub active: Vec<EmotionLabel>,
    /// How long the current dominant has been held.
    pub duration: Duration,
}

/// Consensus-smoothed emotion state. See the module docs for the algorithm.
#[derive(Debug)]
pub struct EmotionStabilizer {
    rng: StdRng,
    history: VecDeque<EmotionLabel>,
    dominant: EmotionLabel,
    dominant_since: Option<Instant>,
}

impl EmotionStabilizer {
    /// Create a stabilizer starting at `Neutral`.
    ///
    /// Production passes `StdRng::from_entropy()`; tests inject a seeded
    /// generator so jitter is reproducible.
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            history: VecDeque::with_capacity(HISTORY_LEN + 1),
            dominant: EmotionLabel::Neutral,
            dominant_since: None,
        }
    }

    /// Stabilize one frame of raw scores.
    pub fn update(&mut self, raw: &EmotionScores, now: Instant) -> EmotionReading {
        let mut scores = *raw;
        for label in EmotionLabel::RANKED {
            let jittered = scores.get(label) + self.rng.gen_range(-JITTER..JITTER);
            scores.set(label, jittered.clamp(0.0, 1.0));
        }

        let top = top_label(&scores);
        self.history.push_back(top);
        if self.history.len() > HISTORY_LEN {
            self.history.pop_front();
        }

        let accepted = if scores.get(top) > INSTANT_ACCEPT {
            top
        } else {
            self.consensus().unwrap_or(EmotionLabel::Neutral)
        };

        if accepted != self.dominant {
            debug!(from = %self.dominant, to = %accepted, "dominant emotion changed");
            self.dominant = accepted;
            self.dominant_since = Some(now);
        }
        let since = self.dominant_since.get_or_insert(now);

        EmotionReading {
            dominant: accepted,
            confidence: scores.get(accepted),
            active: active_set(&scores),
            duration: now.duration_since(*since),
        }
    }

    /// Most frequent label in the history window, if it reached consensus.
    fn consensus(&self) -> Option<EmotionLabel> {
        EmotionLabel::RANKED
            .into_iter()
            .map(|label| (label, self.history.iter().filter(|&&h| h == label).count()))
            .max_by_key(|&(_, count)| count)
            .filter(|&(_, count)| count >= CONSENSUS)
            .map(|(label, _)| label)
    }
}

/// Top-scoring label; ties resolve in [`EmotionLabel::RANKED`] order.
fn top_label(scores: &EmotionScores) -> EmotionLabel {
    let mut best = EmotionLabel::RANKED[0];
    for label in EmotionLabel::RANKED {
        if scores.get(label) > scores.get(best) {
            best = label;
        }
    }
    best
}

/// Labels above their activation threshold.
///
/// `Interested` needs [`INTERESTED_THRESHOLD`] and is dropped entirely while
/// any of `Happy`, `Surprised`, or `Sad` is active.
fn active_set(scores: &EmotionScores) -> Vec<EmotionLabel> {
    let mut active: Vec<EmotionLabel> = EmotionLabel::RANKED
        .into_iter()
        .filter(|&label| {
            let threshold = if label == EmotionLabel::Interested {
                INTERESTED_THRESHOLD
            } else {
                ACTIVE_THRESHOLD
            };
            scores.get(label) >= threshold
        })
        .collect();

    let strong = [
        EmotionLabel::Happy,
        EmotionLabel::Surprised,
        EmotionLabel::Sad,
    ]
    .iter()
    .any(|l| active.contains(l));
    if strong {
        active.retain(|&l| l != EmotionLabel::Interested);
    }

    active
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
