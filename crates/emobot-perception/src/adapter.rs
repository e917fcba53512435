//! Perceptual adapter.
//!
//! Normalizes one raw [`DetectorFrame`] per tick into the [`Percept`] the
//! behavior engine consumes. The detector side is deliberately dumb: it
//! reports what it saw this frame and nothing else; all cross-frame state
//! (attention, emotion smoothing, sessions) lives downstream.
//!
//! Two derived signals are computed here:
//! - **watching** – the raw gaze-alignment score thresholded at
//!   [`WATCHING_THRESHOLD`].
//! - **distance** – face bounding-box area mapped through the non-linear
//!   piecewise curve of [`estimate_distance`] to an estimate in `[0, 1]`
//!   (0.0 = very close) with a coarse [`DistanceBand`] label.
//!
//! # Example
//!
//! ```rust
//! use emobot_perception::adapter::{DetectorFrame, FaceObservation, Percept};
//! use emobot_types::DistanceBand;
//!
//! let frame = DetectorFrame {
//!     face: Some(FaceObservation { center_x: 0.5, area_fraction: 0.2 }),
//!     gaze: Some(0.8),
//!     ..DetectorFrame::default()
//! };
//!
//! let percept = Percept::from_frame(&frame);
//! assert!(percept.presence && percept.watching);
//! assert_eq!(percept.distance.unwrap().band, DistanceBand::Near);
//! ```

use emobot_types::{DistanceBand, DistanceEstimate, EmotionScores, HandGesture};
use serde::{Deserialize, Serialize};

/// Gaze-alignment score above which the user counts as watching the robot.
pub const WATCHING_THRESHOLD: f32 = 0.45;

// ────────────────────────────────────────────────────────────────────────────
// Wire input
// ────────────────────────────────────────────────────────────────────────────

/// Face bounding-box summary from the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Horizontal box center, `0.0` = left frame edge, `1.0` = right edge.
    pub center_x: f32,
    /// Box area as a fraction of the full frame area.
    pub area_fraction: f32,
}

/// One frame of raw detector output, as produced by the vision pipeline or
/// read from a JSONL playback file.
///
/// Every field is optional on the wire; an absent field means "not seen this
/// frame", so an empty object is a valid no-user frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectorFrame {
    #[serde(default)]
    pub face: Option<FaceObservation>,
    /// Raw gaze-alignment score in `[0, 1]`; higher means more head-on.
    #[serde(default)]
    pub gaze: Option<f32>,
    #[serde(default)]
    pub emotions: EmotionScores,
    #[serde(default)]
    pub gesture: Option<HandGesture>,
}

// ────────────────────────────────────────────────────────────────────────────
// Normalized output
// ────────────────────────────────────────────────────────────────────────────

/// Normalized per-frame perception, the engine-facing side of the adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percept {
    /// A face was detected this frame.
    pub presence: bool,
    /// The user is looking at the robot (implies `presence`).
    pub watching: bool,
    /// Horizontal face center in `[0, 1]`, if a face was detected.
    pub face_center_x: Option<f32>,
    /// Distance estimate derived from the face box area.
    pub distance: Option<DistanceEstimate>,
    /// Raw emotion scores, passed through for the stabilizer.
    pub emotions: EmotionScores,
    /// Hand gesture recognized this frame, if any.
    pub gesture: Option<HandGesture>,
}

impl Percept {
    /// Normalize one detector frame.
    ///
    /// Out-of-range coordinates are clamped rather than rejected; a garbage
    /// frame degrades to a plausible one instead of poisoning the tick.
    pub fn from_frame(frame: &DetectorFrame) -> Self {
        let presence = frame.face.is_some();
        let watching = presence && frame.gaze.is_some_and(|g| g > WATCHING_THRESHOLD);

        Self {
            presence,
            watching,
            face_center_x: frame.face.map(|f| f.center_x.clamp(0.0, 1.0)),
            distance: frame.face.map(|f| estimate_distance(f.area_fraction)),
            emotions: frame.emotions,
            gesture: frame.gesture,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Distance estimation
// ────────────────────────────────────────────────────────────────────────────

/// Map a face bounding-box area fraction to a distance estimate.
///
/// Piecewise linear in area, steeper where area changes fastest per metre of
/// real distance. `0.0` is very close, `1.0` is very far.
pub fn estimate_distance(area_fraction: f32) -> DistanceEstimate {
    let a = area_fraction.clamp(0.0, 1.0);

    let (value, band) = if a > 0.25 {
        (0.0, DistanceBand::VeryNear)
    } else if a > 0.1 {
        // 0.1..0.25 → 0.2..0.08
        (0.2 - (a - 0.1) * 0.8, DistanceBand::Near)
    } else if a > 0.03 {
        // 0.03..0.1 → 0.6..0.2
        (0.6 - (a - 0.03) * 5.7, DistanceBand::Medium)
    } else if a > 0.005 {
        // 0.005..0.03 → 0.9..0.6
        (0.9 - (a - 0.005) * 12.0, DistanceBand::Far)
    } else {
        (1.0, DistanceBand::VeryFar)
    };

    DistanceEstimate { value, band }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
