//! Motor scripts.
//!
//! Every [`ActionRequest`] expands into a fixed choreography: a flat list of
//! [`Step`]s alternating drive primitives and pauses. Building a script is
//! pure and instant; executing one (and sleeping out its pauses) is the
//! sequencer's job. Speeds and pause lengths scale linearly with the
//! request's intensity, so a `Happy` at 0.9 drives faster and longer than a
//! `Happy` at 0.5.

use std::time::Duration;

use emobot_types::{ActionRequest, IdleGesture, TurnDirection};
use rand::rngs::StdRng;
use rand::Rng;

/// One primitive drive command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Forward(u8),
    Backward(u8),
    Turn(TurnDirection),
    Stop,
}

/// One step of a script: issue a drive command, or let the current one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Drive(Motion),
    Pause(Duration),
}

/// Expand `request` into its choreography.
///
/// The RNG feeds the random turn directions of `SeekAttention`; every other
/// script is fully determined by the request itself.
pub fn build(request: &ActionRequest, rng: &mut StdRng) -> Vec<Step> {
    match *request {
        ActionRequest::Happy { intensity } => happy(intensity),
        ActionRequest::Curious { intensity } => curious(intensity),
        ActionRequest::Surprised { intensity } => surprised(intensity),
        ActionRequest::SeekAttention { intensity } => seek_attention(intensity, rng),
        ActionRequest::Approach { distance } => approach(distance),
        ActionRequest::Follow { intensity } => follow(intensity),
        ActionRequest::Search { intensity } => search(intensity),
        ActionRequest::Align { direction } => align(direction),
        ActionRequest::Idle { gesture } => idle(gesture),
    }
}

/// Total pause time of a script. Drive commands return immediately, so this
/// is the wall-clock duration of an execution with no faults.
pub fn nominal_duration(steps: &[Step]) -> Duration {
    steps
        .iter()
        .filter_map(|step| match step {
            Step::Pause(d) => Some(*d),
            Step::Drive(_) => None,
        })
        .sum()
}

// ────────────────────────── choreographies ──────────────────────────

/// Excited wiggle: a forward dash, then a quick left-right shake.
fn happy(i: f32) -> Vec<Step> {
    vec![
        Step::Drive(Motion::Forward(speed(70.0, 30.0, i))),
        Step::Pause(secs(0.5 * i)),
        Step::Drive(Motion::Stop),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Turn(TurnDirection::Left)),
        Step::Pause(secs(0.3 * i)),
        Step::Drive(Motion::Turn(TurnDirection::Right)),
        Step::Pause(secs(0.3 * i)),
        Step::Drive(Motion::Stop),
    ]
}

/// Tentative advance with a small look-around.
fn curious(i: f32) -> Vec<Step> {
    vec![
        Step::Drive(Motion::Forward(speed(40.0, 20.0, i))),
        Step::Pause(secs(0.6 * i)),
        Step::Drive(Motion::Stop),
        Step::Pause(secs(0.3)),
        Step::Drive(Motion::Turn(TurnDirection::Left)),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Turn(TurnDirection::Right)),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Stop),
    ]
}

/// Startled jump back, then a cautious half-step forward.
fn surprised(i: f32) -> Vec<Step> {
    vec![
        Step::Drive(Motion::Backward(speed(50.0, 50.0, i))),
        Step::Pause(secs(0.3 * i)),
        Step::Drive(Motion::Stop),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Forward(30)),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Stop),
    ]
}

/// Attention-grabbing dance: one to three random twitches, then a short
/// forward push.
fn seek_attention(i: f32, rng: &mut StdRng) -> Vec<Step> {
    let twitches = (1.0 + i * 2.0) as usize;
    let mut steps = Vec::with_capacity(twitches * 4 + 3);
    for _ in 0..twitches {
        let dir = if rng.gen_bool(0.5) {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        };
        steps.push(Step::Drive(Motion::Turn(dir)));
        steps.push(Step::Pause(secs(0.3)));
        steps.push(Step::Drive(Motion::Stop));
        steps.push(Step::Pause(secs(0.2)));
    }
    steps.push(Step::Drive(Motion::Forward(50)));
    steps.push(Step::Pause(secs(0.5)));
    steps.push(Step::Drive(Motion::Stop));
    steps
}

/// Close the gap to a distant user. Farther targets get more speed and more
/// travel time, capped at 1.5 s per burst.
fn approach(d: f32) -> Vec<Step> {
    if d <= 0.3 {
        return Vec::new();
    }
    vec![
        Step::Drive(Motion::Forward(speed(30.0, 40.0, d))),
        Step::Pause(secs((2.0 * d).min(1.5))),
        Step::Drive(Motion::Stop),
    ]
}

/// One short forward burst of a following session. Repeats come from the
/// arbiter, not from the script.
fn follow(i: f32) -> Vec<Step> {
    vec![
        Step::Drive(Motion::Forward(speed(40.0, 20.0, i))),
        Step::Pause(secs(0.3)),
        Step::Drive(Motion::Stop),
    ]
}

/// Scan for a lost user: sweep left, sweep right a little farther, then
/// split the difference back toward center.
fn search(i: f32) -> Vec<Step> {
    let sweep = 1.5 * i;
    vec![
        Step::Drive(Motion::Turn(TurnDirection::Left)),
        Step::Pause(secs(sweep)),
        Step::Drive(Motion::Stop),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Turn(TurnDirection::Right)),
        Step::Pause(secs(sweep * 1.2)),
        Step::Drive(Motion::Stop),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Turn(TurnDirection::Left)),
        Step::Pause(secs(sweep * 1.2 / 2.0)),
        Step::Drive(Motion::Stop),
    ]
}

/// Single servo correction toward the face.
fn align(direction: TurnDirection) -> Vec<Step> {
    vec![
        Step::Drive(Motion::Turn(direction)),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Stop),
    ]
}

/// Low-energy filler while nobody is around.
fn idle(gesture: IdleGesture) -> Vec<Step> {
    match gesture {
        IdleGesture::GlanceLeft => glance(TurnDirection::Left),
        IdleGesture::GlanceRight => glance(TurnDirection::Right),
        IdleGesture::Shuffle => vec![
            Step::Drive(Motion::Forward(30)),
            Step::Pause(secs(0.15)),
            Step::Drive(Motion::Stop),
            Step::Pause(secs(0.2)),
            Step::Drive(Motion::Backward(30)),
            Step::Pause(secs(0.15)),
            Step::Drive(Motion::Stop),
        ],
    }
}

fn glance(first: TurnDirection) -> Vec<Step> {
    vec![
        Step::Drive(Motion::Turn(first)),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Stop),
        Step::Pause(secs(0.3)),
        Step::Drive(Motion::Turn(first.opposite())),
        Step::Pause(secs(0.2)),
        Step::Drive(Motion::Stop),
    ]
}

// ────────────────────────── helpers ──────────────────────────

fn speed(base: f32, scale: f32, factor: f32) -> u8 {
    (base + scale * factor.clamp(0.0, 1.0)) as u8
}

fn secs(s: f32) -> Duration {
    Duration::from_secs_f32(s.max(0.0))
}
