//! `emobot-perception` – Perception layer.
//!
//! Turns raw per-frame detector output into the stable signals the behavior
//! engine consumes: a normalized percept, a consensus-smoothed emotion
//! reading, and an attention classification with its interaction-level
//! accumulator. Everything here is synchronous and side-effect free apart
//! from internal history; hardware and scheduling live elsewhere.
//!
//! # Modules
//!
//! - [`adapter`] – [`Percept`][adapter::Percept]: per-frame normalization of
//!   detector output, including gaze thresholding and the non-linear
//!   face-area → distance curve.
//! - [`emotion`] – [`EmotionStabilizer`][emotion::EmotionStabilizer]: jitter,
//!   clamp, and 5-frame consensus smoothing of raw emotion scores.
//! - [`attention`] – [`AttentionTracker`][attention::AttentionTracker]:
//!   presence/gaze classification plus the bounded interaction level and the
//!   weighted engagement target.

pub mod adapter;
pub mod attention;
pub mod emotion;

pub use adapter::{estimate_distance, DetectorFrame, FaceObservation, Percept};
pub use attention::{AttentionTracker, EngagementUpdate};
pub use emotion::{EmotionReading, EmotionStabilizer};
