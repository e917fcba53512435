//! Frame sources for the control loop.
//!
//! The binary carries no camera pipeline. Detector frames come either from
//! a JSONL recording (one frame per line, as emitted by the vision side) or
//! from [`Feed::demo`], a built-in scenario that walks the engine through
//! its repertoire in about half a minute.

use std::fs;
use std::iter::repeat_n;
use std::path::Path;

use emobot_perception::{DetectorFrame, FaceObservation};
use emobot_types::{EmotionScores, HandGesture};

/// A finite sequence of detector frames, played back one per tick.
#[derive(Debug, Clone)]
pub struct Feed {
    frames: Vec<DetectorFrame>,
    cursor: usize,
}

impl Feed {
    /// Load a recording: one JSON frame per line, blank lines ignored.
    pub fn from_jsonl(path: &Path) -> Result<Feed, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read frame file {}: {}", path.display(), e))?;

        let mut frames = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let frame: DetectorFrame = serde_json::from_str(line)
                .map_err(|e| format!("Bad frame on line {}: {}", idx + 1, e))?;
            frames.push(frame);
        }

        if frames.is_empty() {
            return Err(format!("No frames in {}", path.display()));
        }

        Ok(Feed { frames, cursor: 0 })
    }

    /// Built-in scenario, 870 frames (~29 s at 30 fps).
    ///
    /// Someone ignores the robot, makes eye contact from across the room,
    /// walks up smiling, waves, holds out an open palm for a follow, then
    /// leaves. Played in order this exercises attention seeking, approach,
    /// emotional responses, gesture reactions, a following session with
    /// servo corrections, search, and finally an idle gesture.
    pub fn demo() -> Feed {
        let mut frames = Vec::new();

        // Present but looking elsewhere.
        frames.extend(repeat_n(face(0.5, 0.02, 0.2), 90));

        // Eye contact from far away.
        frames.extend(repeat_n(face(0.5, 0.01, 0.9), 150));

        // Up close and visibly pleased.
        let mut pleased = face(0.5, 0.3, 0.9);
        pleased.emotions = EmotionScores {
            happy: 0.85,
            neutral: 0.1,
            ..EmotionScores::default()
        };
        frames.extend(repeat_n(pleased, 120));

        // A wave.
        let mut waving = pleased;
        waving.gesture = Some(HandGesture::Wave);
        frames.extend(repeat_n(waving, 90));

        // An open palm, first off to the right, then re-centered.
        let mut palm = face(0.8, 0.05, 0.9);
        palm.gesture = Some(HandGesture::OpenHand);
        frames.extend(repeat_n(palm, 30));
        palm.face = Some(FaceObservation {
            center_x: 0.6,
            area_fraction: 0.05,
        });
        frames.extend(repeat_n(palm, 120));

        // Gone. Long enough for a search and then an idle gesture.
        frames.extend(repeat_n(DetectorFrame::default(), 270));

        Feed { frames, cursor: 0 }
    }

    /// Total frames in the source, including any already played.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Iterator for Feed {
    type Item = DetectorFrame;

    fn next(&mut self) -> Option<DetectorFrame> {
        let frame = self.frames.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(frame)
    }
}

fn face(center_x: f32, area_fraction: f32, gaze: f32) -> DetectorFrame {
    DetectorFrame {
        face: Some(FaceObservation {
            center_x,
            area_fraction,
        }),
        gaze: Some(gaze),
        emotions: EmotionScores::neutral_baseline(),
        ..DetectorFrame::default()
    }
}
