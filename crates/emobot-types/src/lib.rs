use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Per-frame classification of whether a person is present and looking at the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttentionState {
    /// No face in frame.
    NoUser,
    /// A face is present but the gaze is elsewhere.
    NotWatching,
    /// A face is present and oriented toward the camera.
    Watching,
}

impl fmt::Display for AttentionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttentionState::NoUser => write!(f, "No User"),
            AttentionState::NotWatching => write!(f, "Not Watching"),
            AttentionState::Watching => write!(f, "Watching"),
        }
    }
}

/// The emotion vocabulary the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    Neutral,
    Happy,
    Surprised,
    Sad,
    Interested,
}

impl EmotionLabel {
    /// Labels in ranking order. Exact score ties resolve to the earlier
    /// entry, so strong primary emotions win over `Interested`/`Neutral`.
    pub const RANKED: [EmotionLabel; 5] = [
        EmotionLabel::Happy,
        EmotionLabel::Surprised,
        EmotionLabel::Sad,
        EmotionLabel::Interested,
        EmotionLabel::Neutral,
    ];
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmotionLabel::Neutral => write!(f, "Neutral"),
            EmotionLabel::Happy => write!(f, "Happy"),
            EmotionLabel::Surprised => write!(f, "Surprised"),
            EmotionLabel::Sad => write!(f, "Sad"),
            EmotionLabel::Interested => write!(f, "Interested"),
        }
    }
}

/// Confidence in `[0,1]` for every emotion label of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionScores {
    #[serde(default)]
    pub neutral: f32,
    #[serde(default)]
    pub happy: f32,
    #[serde(default)]
    pub surprised: f32,
    #[serde(default)]
    pub sad: f32,
    #[serde(default)]
    pub interested: f32,
}

impl EmotionScores {
    /// The resting profile a detector reports for an expressionless face.
    pub fn neutral_baseline() -> Self {
        Self {
            neutral: 0.65,
            ..Self::default()
        }
    }

    pub fn get(&self, label: EmotionLabel) -> f32 {
        match label {
            EmotionLabel::Neutral => self.neutral,
            EmotionLabel::Happy => self.happy,
            EmotionLabel::Surprised => self.surprised,
            EmotionLabel::Sad => self.sad,
            EmotionLabel::Interested => self.interested,
        }
    }

    pub fn set(&mut self, label: EmotionLabel, value: f32) {
        match label {
            EmotionLabel::Neutral => self.neutral = value,
            EmotionLabel::Happy => self.happy = value,
            EmotionLabel::Surprised => self.surprised = value,
            EmotionLabel::Sad => self.sad = value,
            EmotionLabel::Interested => self.interested = value,
        }
    }
}

/// Hand gestures reported by the detector. Static poses come from a single
/// frame; `Wave`, `ComeHere` and `GoAway` are recognized over a motion window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandGesture {
    OpenHand,
    Fist,
    Point,
    Peace,
    RockOn,
    ThreeFingers,
    Wave,
    ComeHere,
    GoAway,
    Unknown,
}

/// Rotation sense for corrective turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    pub fn opposite(self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnDirection::Left => write!(f, "left"),
            TurnDirection::Right => write!(f, "right"),
        }
    }
}

/// Low-energy motions played while nobody is around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdleGesture {
    GlanceLeft,
    GlanceRight,
    Shuffle,
}

/// A single behavior the arbiter asks the motor sequencer to perform.
///
/// Every variant carries the scalar that scales its motor speeds and
/// durations. `Align` is the corrective rotation used for centering a
/// person; it travels through the same command queue as everything else so
/// the hardware only ever has one writer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params")]
pub enum ActionRequest {
    Happy { intensity: f32 },
    Curious { intensity: f32 },
    Surprised { intensity: f32 },
    SeekAttention { intensity: f32 },
    Approach { distance: f32 },
    Follow { intensity: f32 },
    Search { intensity: f32 },
    Align { direction: TurnDirection },
    Idle { gesture: IdleGesture },
}

impl ActionRequest {
    /// Short label for logs and telemetry.
    pub fn name(&self) -> &'static str {
        match self {
            ActionRequest::Happy { .. } => "happy",
            ActionRequest::Curious { .. } => "curious",
            ActionRequest::Surprised { .. } => "surprised",
            ActionRequest::SeekAttention { .. } => "seek_attention",
            ActionRequest::Approach { .. } => "approach",
            ActionRequest::Follow { .. } => "follow",
            ActionRequest::Search { .. } => "search",
            ActionRequest::Align { .. } => "align",
            ActionRequest::Idle { .. } => "idle",
        }
    }

    /// The scalar in `[0,1]` that scales the script (distance doubles as
    /// intensity for `Approach`; fixed-magnitude variants report 1.0).
    pub fn intensity(&self) -> f32 {
        match self {
            ActionRequest::Happy { intensity }
            | ActionRequest::Curious { intensity }
            | ActionRequest::Surprised { intensity }
            | ActionRequest::SeekAttention { intensity }
            | ActionRequest::Follow { intensity }
            | ActionRequest::Search { intensity } => *intensity,
            ActionRequest::Approach { distance } => *distance,
            ActionRequest::Align { .. } | ActionRequest::Idle { .. } => 1.0,
        }
    }

    /// `Follow` repeats every control tick while a following session is
    /// active, so it never counts against the global action cooldown.
    /// Corrective `Align`s are gated contextually by the arbiter.
    pub fn cooldown_exempt(&self) -> bool {
        matches!(self, ActionRequest::Follow { .. })
    }

    /// Requests that servo the robot toward a moving target go stale within
    /// a tick; the queue drops them when the worker is busy instead of
    /// letting them pile up.
    pub fn droppable(&self) -> bool {
        matches!(
            self,
            ActionRequest::Follow { .. } | ActionRequest::Align { .. }
        )
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Coarse distance label derived from the face bounding-box area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceBand {
    VeryNear,
    Near,
    Medium,
    Far,
    VeryFar,
}

impl fmt::Display for DistanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceBand::VeryNear => write!(f, "Very Near"),
            DistanceBand::Near => write!(f, "Near"),
            DistanceBand::Medium => write!(f, "Medium"),
            DistanceBand::Far => write!(f, "Far"),
            DistanceBand::VeryFar => write!(f, "Very Far"),
        }
    }
}

/// Normalized distance reading: 0.0 is very close, 1.0 is far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceEstimate {
    pub value: f32,
    pub band: DistanceBand,
}

/// Health of the hardware path. `Degraded` is permanent for the process
/// lifetime: once tripped, motor commands are simulated only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakerState {
    Healthy,
    Degraded,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakerState::Healthy => write!(f, "healthy"),
            BreakerState::Degraded => write!(f, "degraded"),
        }
    }
}

/// Per-tick engine snapshot published for rendering and diagnostics. The
/// display side only reads; nothing flows back into the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickTelemetry {
    pub timestamp: DateTime<Utc>,
    pub attention: AttentionState,
    pub dominant: EmotionLabel,
    pub confidence: f32,
    pub emotion_duration_ms: u64,
    pub active: Vec<EmotionLabel>,
    pub interaction_level: f32,
    pub engagement_target: f32,
    pub distance_band: Option<DistanceBand>,
    /// Id of the live following session, if any.
    pub following: Option<Uuid>,
    pub search_pending: bool,
    pub breaker: BreakerState,
    pub last_action: Option<ActionRequest>,
}

/// Global error type spanning hardware failures, startup misconfiguration,
/// and telemetry channel problems.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum EmoError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Telemetry Channel Error: {0}")]
    Channel(String),
}
