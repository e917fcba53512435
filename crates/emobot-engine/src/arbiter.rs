//! Behavior arbitration.
//!
//! [`BehaviorArbiter`] turns one perception tick into at most one
//! [`ActionRequest`]. Rules run in a fixed priority order:
//!
//! 1. an open hand while watched starts or refreshes a following session,
//!    and wave / come-here gestures trigger immediate reactions;
//! 2. an active following session servos toward the user (off-center turn,
//!    then a short forward burst) and suppresses everything below;
//! 3. plain watching keeps the user framed (turn, then approach) and runs
//!    the emotional-response ladder;
//! 4. a user who looks away earns a `SeekAttention` nudge after long
//!    silence;
//! 5. an absent user accrues toward `Search` and, eventually, `Idle`
//!    fidgets;
//! 6. a pending search fires once its own cooldown allows.
//!
//! One global cooldown (3 s) spaces out every discrete action. `Follow`
//! bursts and in-session `Align` corrections bypass the gate because they
//! must repeat every tick while steering; `Follow` still stamps the clock
//! so reactions stay quiet while a session is driving.
//!
//! Selection and commitment are split: [`BehaviorArbiter::decide`] picks a
//! request without burning any cooldown, and the engine calls
//! [`BehaviorArbiter::note_issued`] only after the sequencer accepts it. A
//! request dropped by a busy sequencer therefore stays eligible on the next
//! tick.

use std::time::{Duration, Instant};

use emobot_perception::{EmotionReading, Percept};
use emobot_types::{ActionRequest, AttentionState, EmotionLabel, HandGesture, IdleGesture, TurnDirection};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

// ── pacing ──
const GLOBAL_COOLDOWN: Duration = Duration::from_secs(3);
const APPROACH_COOLDOWN: Duration = Duration::from_secs(8);
const SEARCH_COOLDOWN: Duration = Duration::from_secs(15);
const IDLE_COOLDOWN: Duration = Duration::from_secs(12);
const ATTENTION_SEEKING_THRESHOLD: Duration = Duration::from_secs(30);
const FOLLOW_CHECK_INTERVAL: Duration = Duration::from_millis(500);

// ── watching-duration windows for the emotion ladder ──
const GREETING_WINDOW: Duration = Duration::from_secs(2);
const SETTLED_AFTER: Duration = Duration::from_secs(5);

// ── frame counters ──
const NO_FACE_SEARCH_FRAMES: u32 = 15;
const NO_USER_SEARCH_FRAMES: u32 = 30;
const IDLE_AFTER_FRAMES: u32 = 150;

// ── geometry ──
const SERVO_CENTER_MIN: f32 = 0.3;
const SERVO_CENTER_MAX: f32 = 0.7;
const FRAME_CENTER_MIN: f32 = 0.25;
const FRAME_CENTER_MAX: f32 = 0.75;
const FOLLOW_NEAR: f32 = 0.25;
const APPROACH_MIN_DISTANCE: f32 = 0.3;

/// A user-initiated "follow me" episode, started by an open hand, kept
/// alive by periodic hand re-checks, and over the instant the user stops
/// watching.
struct FollowingSession {
    id: Uuid,
    started_at: Instant,
    last_check: Instant,
}

/// Per-tick decision state machine. See the module docs for the rule order.
pub struct BehaviorArbiter {
    rng: StdRng,
    watching_since: Option<Instant>,
    session: Option<FollowingSession>,
    search_pending: bool,
    no_detection_frames: u32,
    no_user_frames: u32,
    last_action: Option<Instant>,
    last_approach: Option<Instant>,
    last_search: Option<Instant>,
    last_idle: Option<Instant>,
}

impl BehaviorArbiter {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            watching_since: None,
            session: None,
            search_pending: false,
            no_detection_frames: 0,
            no_user_frames: 0,
            last_action: None,
            last_approach: None,
            last_search: None,
            last_idle: None,
        }
    }

    /// Id of the active following session, if any.
    pub fn following(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn search_pending(&self) -> bool {
        self.search_pending
    }

    /// Pick at most one action for this tick. No cooldown is burnt here;
    /// call [`note_issued`](Self::note_issued) once the request is actually
    /// accepted downstream.
    pub fn decide(
        &mut self,
        state: AttentionState,
        percept: &Percept,
        reading: &EmotionReading,
        level: f32,
        now: Instant,
    ) -> Option<ActionRequest> {
        self.track_attention(state, now);

        if state == AttentionState::Watching {
            if let Some(request) = self.handle_gesture(percept.gesture, now) {
                return Some(request);
            }
        }

        if self.session.is_some() {
            if state == AttentionState::Watching {
                self.recheck_session(percept.gesture, now);
                if self.session.is_some() {
                    return self.servo_toward(percept);
                }
                return None;
            }
            // Leaving Watching ends the session on the spot; the periodic
            // re-check only bridges hand gaps while the user keeps watching.
            self.end_session("attention lost", now);
        }

        match state {
            AttentionState::Watching => {
                if let Some(request) = self.frame_user(percept, now) {
                    return Some(request);
                }
                if let Some(request) = self.emotion_ladder(reading, level, now) {
                    return Some(request);
                }
            }
            AttentionState::NotWatching => {
                self.no_user_frames = 0;
                if percept.presence {
                    self.no_detection_frames = 0;
                    if ready(self.last_action, ATTENTION_SEEKING_THRESHOLD, now) {
                        return Some(ActionRequest::SeekAttention { intensity: 0.5 });
                    }
                } else {
                    self.no_detection_frames += 1;
                    if self.no_detection_frames > NO_FACE_SEARCH_FRAMES {
                        self.search_pending = true;
                    }
                }
            }
            AttentionState::NoUser => {
                self.no_detection_frames += 1;
                self.no_user_frames += 1;
                if self.no_detection_frames > NO_USER_SEARCH_FRAMES {
                    self.search_pending = true;
                }
                if self.no_user_frames >= IDLE_AFTER_FRAMES
                    && self.global_ready(now)
                    && ready(self.last_idle, IDLE_COOLDOWN, now)
                {
                    return Some(ActionRequest::Idle {
                        gesture: self.pick_idle_gesture(),
                    });
                }
            }
        }

        self.consider_search(now)
    }

    /// Commit the cooldown clocks for an accepted request. In-session
    /// `Align` corrections touch nothing; `Search` also clears its pending
    /// flag.
    pub fn note_issued(&mut self, request: &ActionRequest, now: Instant) {
        match request {
            ActionRequest::Align { .. } if self.session.is_some() => return,
            ActionRequest::Approach { .. } => self.last_approach = Some(now),
            ActionRequest::Search { .. } => {
                self.last_search = Some(now);
                self.search_pending = false;
            }
            ActionRequest::Idle { .. } => self.last_idle = Some(now),
            _ => {}
        }
        self.last_action = Some(now);
    }

    // ---------------- per-rule helpers ----------------

    /// Keep the watching clock, and clear the absence bookkeeping whenever
    /// the user is engaged again.
    fn track_attention(&mut self, state: AttentionState, now: Instant) {
        if state == AttentionState::Watching {
            if self.watching_since.is_none() {
                self.watching_since = Some(now);
            }
            self.no_detection_frames = 0;
            self.no_user_frames = 0;
            self.search_pending = false;
        } else {
            self.watching_since = None;
        }
    }

    fn handle_gesture(
        &mut self,
        gesture: Option<HandGesture>,
        now: Instant,
    ) -> Option<ActionRequest> {
        match gesture? {
            HandGesture::OpenHand => {
                match &mut self.session {
                    Some(session) => session.last_check = now,
                    None => {
                        let session = FollowingSession {
                            id: Uuid::new_v4(),
                            started_at: now,
                            last_check: now,
                        };
                        info!(session = %session.id, "following session started");
                        self.session = Some(session);
                    }
                }
                None
            }
            HandGesture::Wave if self.global_ready(now) => {
                Some(ActionRequest::Happy { intensity: 0.7 })
            }
            HandGesture::ComeHere if self.global_ready(now) => {
                Some(ActionRequest::Curious { intensity: 0.8 })
            }
            _ => None,
        }
    }

    /// Every `FOLLOW_CHECK_INTERVAL`, require that a hand is still somewhere
    /// in frame; otherwise the session ends. Between checks, short gesture
    /// gaps are tolerated.
    fn recheck_session(&mut self, gesture: Option<HandGesture>, now: Instant) {
        let due = self
            .session
            .as_ref()
            .is_some_and(|s| now.duration_since(s.last_check) >= FOLLOW_CHECK_INTERVAL);
        if !due {
            return;
        }
        if gesture.is_some() {
            if let Some(session) = &mut self.session {
                session.last_check = now;
            }
            return;
        }
        self.end_session("hand lost", now);
    }

    fn end_session(&mut self, reason: &str, now: Instant) {
        if let Some(session) = self.session.take() {
            info!(
                session = %session.id,
                duration_s = now.duration_since(session.started_at).as_secs_f32(),
                reason,
                "following session ended"
            );
        }
    }

    /// In-session steering: turn until the face sits in the middle band,
    /// then close the gap with short bursts. Both bypass the global gate.
    fn servo_toward(&self, percept: &Percept) -> Option<ActionRequest> {
        let x = percept.face_center_x?;
        if x < SERVO_CENTER_MIN {
            return Some(ActionRequest::Align {
                direction: TurnDirection::Left,
            });
        }
        if x > SERVO_CENTER_MAX {
            return Some(ActionRequest::Align {
                direction: TurnDirection::Right,
            });
        }
        let distance = percept.distance?;
        (distance.value > FOLLOW_NEAR).then(|| ActionRequest::Follow {
            intensity: (distance.value * 1.2).min(0.9),
        })
    }

    /// Out-of-session framing: center the face first, then close distance.
    /// Approach keeps its own 8 s spacing on top of the global gate.
    fn frame_user(&mut self, percept: &Percept, now: Instant) -> Option<ActionRequest> {
        let x = percept.face_center_x?;
        if x < FRAME_CENTER_MIN || x > FRAME_CENTER_MAX {
            if self.global_ready(now) {
                let direction = if x < FRAME_CENTER_MIN {
                    TurnDirection::Left
                } else {
                    TurnDirection::Right
                };
                return Some(ActionRequest::Align { direction });
            }
            return None;
        }
        let distance = percept.distance?;
        if distance.value > APPROACH_MIN_DISTANCE
            && self.global_ready(now)
            && ready(self.last_approach, APPROACH_COOLDOWN, now)
        {
            return Some(ActionRequest::Approach {
                distance: distance.value,
            });
        }
        None
    }

    /// The watching emotional-response ladder. One rung per tick, first
    /// match wins: a greeting right after eye contact, a periodic response
    /// once the user has settled, and strong dominant emotions in between.
    fn emotion_ladder(
        &mut self,
        reading: &EmotionReading,
        level: f32,
        now: Instant,
    ) -> Option<ActionRequest> {
        if !self.global_ready(now) {
            return None;
        }
        let watching_for = self
            .watching_since
            .map(|t| now.duration_since(t))
            .unwrap_or_default();

        if watching_for < GREETING_WINDOW {
            return Some(ActionRequest::Happy {
                intensity: (0.4 + level / 20.0).min(0.7),
            });
        }
        if watching_for > SETTLED_AFTER {
            if reading.active.contains(&EmotionLabel::Happy) {
                return Some(ActionRequest::Happy {
                    intensity: reading.confidence.min(0.9),
                });
            }
            if reading.active.contains(&EmotionLabel::Surprised) {
                return Some(ActionRequest::Surprised {
                    intensity: reading.confidence.min(0.8),
                });
            }
            if self.rng.gen_bool(0.3) {
                return Some(ActionRequest::Curious { intensity: 0.5 });
            }
            return None;
        }
        match reading.dominant {
            EmotionLabel::Happy if reading.confidence > 0.6 => Some(ActionRequest::Happy {
                intensity: reading.confidence,
            }),
            EmotionLabel::Surprised if reading.confidence > 0.7 => {
                Some(ActionRequest::Surprised {
                    intensity: reading.confidence,
                })
            }
            _ => None,
        }
    }

    fn consider_search(&mut self, now: Instant) -> Option<ActionRequest> {
        if self.search_pending
            && self.session.is_none()
            && self.global_ready(now)
            && ready(self.last_search, SEARCH_COOLDOWN, now)
        {
            debug!("search window open, scanning for the user");
            return Some(ActionRequest::Search { intensity: 0.7 });
        }
        None
    }

    fn pick_idle_gesture(&mut self) -> IdleGesture {
        match self.rng.gen_range(0..3u8) {
            0 => IdleGesture::GlanceLeft,
            1 => IdleGesture::GlanceRight,
            _ => IdleGesture::Shuffle,
        }
    }

    fn global_ready(&self, now: Instant) -> bool {
        ready(self.last_action, GLOBAL_COOLDOWN, now)
    }
}

fn ready(stamp: Option<Instant>, spacing: Duration, now: Instant) -> bool {
    stamp.map_or(true, |t| now.duration_since(t) >= spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emobot_perception::estimate_distance;
    use emobot_types::EmotionScores;
    use rand::SeedableRng;

    const TICK: Duration = Duration::from_millis(33);

    fn arbiter() -> BehaviorArbiter {
        BehaviorArbiter::new(StdRng::seed_from_u64(9))
    }

    fn watching(x: f32, area: f32) -> Percept {
        Percept {
            presence: true,
            watching: true,
            face_center_x: Some(x),
            distance: Some(estimate_distance(area)),
            emotions: EmotionScores::neutral_baseline(),
            gesture: None,
        }
    }

    fn with_gesture(mut percept: Percept, gesture: HandGesture) -> Percept {
        percept.gesture = Some(gesture);
        percept
    }

    fn looking_away() -> Percept {
        Percept {
            presence: true,
            watching: false,
            face_center_x: Some(0.5),
            distance: Some(estimate_distance(0.3)),
            emotions: EmotionScores::neutral_baseline(),
            gesture: None,
        }
    }

    fn absent() -> Percept {
        Percept {
            presence: false,
            watching: false,
            face_center_x: None,
            distance: None,
            emotions: EmotionScores::neutral_baseline(),
            gesture: None,
        }
    }

    fn neutral_reading() -> EmotionReading {
        EmotionReading {
            dominant: EmotionLabel::Neutral,
            confidence: 0.65,
            active: vec![EmotionLabel::Neutral],
            duration: Duration::ZERO,
        }
    }

    fn happy_reading(confidence: f32) -> EmotionReading {
        EmotionReading {
            dominant: EmotionLabel::Happy,
            confidence,
            active: vec![EmotionLabel::Happy],
            duration: Duration::from_secs(1),
        }
    }

    #[test]
    fn greeting_fires_on_first_watching_tick() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        let request = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.3),
            &neutral_reading(),
            1.6,
            t0,
        );
        match request {
            Some(ActionRequest::Happy { intensity }) => {
                assert!((intensity - 0.48).abs() < 1e-5);
            }
            other => panic!("expected a greeting, got {other:?}"),
        }
        arb.note_issued(&request.unwrap(), t0);

        // Cooled down for the next 3 s.
        let next = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.3),
            &neutral_reading(),
            2.2,
            t0 + TICK,
        );
        assert_eq!(next, None);
    }

    #[test]
    fn settled_watcher_gets_responses_to_active_emotions() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        let greeting = arb
            .decide(
                AttentionState::Watching,
                &watching(0.5, 0.3),
                &neutral_reading(),
                1.6,
                t0,
            )
            .expect("greeting");
        arb.note_issued(&greeting, t0);

        // Past the settled threshold with happy active.
        let request = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.3),
            &happy_reading(0.95),
            5.0,
            t0 + Duration::from_secs(6),
        );
        assert_eq!(
            request,
            Some(ActionRequest::Happy { intensity: 0.9 }),
            "settled response caps at 0.9"
        );
    }

    #[test]
    fn settled_watcher_rolls_for_curiosity_when_nothing_is_active() {
        let t0 = Instant::now();
        let mut saw_curious = false;
        let mut saw_nothing = false;

        for seed in 0..60 {
            let mut arb = BehaviorArbiter::new(StdRng::seed_from_u64(seed));
            let greeting = arb
                .decide(
                    AttentionState::Watching,
                    &watching(0.5, 0.3),
                    &neutral_reading(),
                    1.6,
                    t0,
                )
                .expect("greeting");
            arb.note_issued(&greeting, t0);

            match arb.decide(
                AttentionState::Watching,
                &watching(0.5, 0.3),
                &neutral_reading(),
                5.0,
                t0 + Duration::from_secs(6),
            ) {
                Some(ActionRequest::Curious { intensity }) => {
                    assert!((intensity - 0.5).abs() < 1e-6);
                    saw_curious = true;
                }
                None => saw_nothing = true,
                other => panic!("unexpected settled outcome {other:?}"),
            }
        }
        assert!(saw_curious && saw_nothing);
    }

    #[test]
    fn strong_dominant_emotions_fire_between_the_windows() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let greeting = arb
            .decide(
                AttentionState::Watching,
                &watching(0.5, 0.3),
                &neutral_reading(),
                1.6,
                t0,
            )
            .expect("greeting");
        arb.note_issued(&greeting, t0);

        // 4 s in: between the greeting and settled windows.
        let at = t0 + Duration::from_secs(4);
        let strong = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.3),
            &happy_reading(0.75),
            5.0,
            at,
        );
        assert_eq!(strong, Some(ActionRequest::Happy { intensity: 0.75 }));

        // Below the confidence bar nothing fires.
        let weak = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.3),
            &happy_reading(0.55),
            5.0,
            at,
        );
        assert_eq!(weak, None);
    }

    #[test]
    fn framing_beats_the_ladder_and_stamps_the_clock() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        let request = arb.decide(
            AttentionState::Watching,
            &watching(0.1, 0.3),
            &neutral_reading(),
            1.6,
            t0,
        );
        assert_eq!(
            request,
            Some(ActionRequest::Align {
                direction: TurnDirection::Left
            })
        );
        arb.note_issued(&request.unwrap(), t0);

        // Off-center the other way, but still cooling down.
        let gated = arb.decide(
            AttentionState::Watching,
            &watching(0.9, 0.3),
            &neutral_reading(),
            2.2,
            t0 + Duration::from_secs(1),
        );
        assert_eq!(gated, None);

        let after = arb.decide(
            AttentionState::Watching,
            &watching(0.9, 0.3),
            &neutral_reading(),
            2.8,
            t0 + Duration::from_millis(3100),
        );
        assert_eq!(
            after,
            Some(ActionRequest::Align {
                direction: TurnDirection::Right
            })
        );
    }

    #[test]
    fn approach_needs_a_centered_distant_face_and_its_own_spacing() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        // area 0.01 puts the user far away (estimate ~0.84).
        let first = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.01),
            &neutral_reading(),
            1.6,
            t0,
        );
        match first {
            Some(ActionRequest::Approach { distance }) => {
                assert!((distance - 0.84).abs() < 1e-4);
            }
            other => panic!("expected an approach, got {other:?}"),
        }
        arb.note_issued(&first.unwrap(), t0);

        // Global gate reopens at 3 s but the approach family waits 8 s.
        let throttled = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.01),
            &neutral_reading(),
            2.8,
            t0 + Duration::from_secs(4),
        );
        assert_eq!(throttled, None);

        let again = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.01),
            &neutral_reading(),
            3.4,
            t0 + Duration::from_millis(8100),
        );
        assert!(matches!(again, Some(ActionRequest::Approach { .. })));
    }

    #[test]
    fn open_hand_starts_a_session_and_follow_repeats_every_tick() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let percept = with_gesture(watching(0.5, 0.05), HandGesture::OpenHand);

        let first = arb.decide(AttentionState::Watching, &percept, &neutral_reading(), 3.0, t0);
        assert!(arb.following().is_some());
        match first {
            Some(ActionRequest::Follow { intensity }) => {
                // distance 0.486 scaled by 1.2
                assert!((intensity - 0.5832).abs() < 1e-3);
            }
            other => panic!("expected a follow burst, got {other:?}"),
        }
        arb.note_issued(&first.unwrap(), t0);

        // Follow is exempt from the global gate and repeats immediately.
        let second = arb.decide(
            AttentionState::Watching,
            &percept,
            &neutral_reading(),
            3.0,
            t0 + TICK,
        );
        assert!(matches!(second, Some(ActionRequest::Follow { .. })));
    }

    #[test]
    fn session_tolerates_gaps_shorter_than_the_check_interval() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let open = with_gesture(watching(0.5, 0.05), HandGesture::OpenHand);
        arb.decide(AttentionState::Watching, &open, &neutral_reading(), 3.0, t0);

        let bare = watching(0.5, 0.05);
        let request = arb.decide(
            AttentionState::Watching,
            &bare,
            &neutral_reading(),
            3.0,
            t0 + Duration::from_millis(300),
        );
        assert!(arb.following().is_some());
        assert!(matches!(request, Some(ActionRequest::Follow { .. })));
    }

    #[test]
    fn session_ends_at_the_recheck_once_the_hand_is_gone() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let open = with_gesture(watching(0.5, 0.05), HandGesture::OpenHand);
        arb.decide(AttentionState::Watching, &open, &neutral_reading(), 3.0, t0);

        let request = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.05),
            &neutral_reading(),
            3.0,
            t0 + Duration::from_millis(600),
        );
        assert_eq!(request, None);
        assert!(arb.following().is_none());
    }

    #[test]
    fn any_hand_shape_passes_the_recheck() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let open = with_gesture(watching(0.5, 0.05), HandGesture::OpenHand);
        arb.decide(AttentionState::Watching, &open, &neutral_reading(), 3.0, t0);

        let fist = with_gesture(watching(0.5, 0.05), HandGesture::Fist);
        arb.decide(
            AttentionState::Watching,
            &fist,
            &neutral_reading(),
            3.0,
            t0 + Duration::from_millis(600),
        );
        assert!(arb.following().is_some());

        // The passed check reset the timer, so a bare hand 0.4 s later is
        // still inside the tolerance window.
        arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.05),
            &neutral_reading(),
            3.0,
            t0 + Duration::from_millis(1000),
        );
        assert!(arb.following().is_some());

        arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.05),
            &neutral_reading(),
            3.0,
            t0 + Duration::from_millis(1200),
        );
        assert!(arb.following().is_none());
    }

    #[test]
    fn attention_loss_ends_the_session_immediately() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let open = with_gesture(watching(0.5, 0.05), HandGesture::OpenHand);
        arb.decide(AttentionState::Watching, &open, &neutral_reading(), 3.0, t0);
        assert!(arb.following().is_some());

        // 200 ms in, well before any re-check is due, the user looks away
        // with the face drifting off-center.
        let away = Percept {
            face_center_x: Some(0.1),
            ..looking_away()
        };
        let decision = arb.decide(
            AttentionState::NotWatching,
            &away,
            &neutral_reading(),
            3.0,
            t0 + Duration::from_millis(200),
        );
        assert!(
            arb.following().is_none(),
            "the session must not outlive Watching"
        );
        assert!(
            !matches!(
                decision,
                Some(ActionRequest::Align { .. } | ActionRequest::Follow { .. })
            ),
            "no steering toward a user who stopped watching"
        );
    }

    #[test]
    fn servo_corrections_skip_every_cooldown_clock() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let off_center = with_gesture(watching(0.1, 0.05), HandGesture::OpenHand);

        let first = arb.decide(AttentionState::Watching, &off_center, &neutral_reading(), 3.0, t0);
        assert_eq!(
            first,
            Some(ActionRequest::Align {
                direction: TurnDirection::Left
            })
        );
        arb.note_issued(&first.unwrap(), t0);

        let second = arb.decide(
            AttentionState::Watching,
            &off_center,
            &neutral_reading(),
            3.0,
            t0 + TICK,
        );
        assert!(matches!(second, Some(ActionRequest::Align { .. })));

        // End the session, then show the global clock was never stamped:
        // a greeting still fires instantly.
        arb.decide(
            AttentionState::NoUser,
            &absent(),
            &neutral_reading(),
            1.0,
            t0 + Duration::from_millis(700),
        );
        assert!(arb.following().is_none());

        let greeting = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.3),
            &neutral_reading(),
            1.6,
            t0 + Duration::from_millis(800),
        );
        assert!(matches!(greeting, Some(ActionRequest::Happy { .. })));
    }

    #[test]
    fn follow_bursts_stamp_the_global_clock() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let open = with_gesture(watching(0.5, 0.05), HandGesture::OpenHand);

        let follow = arb
            .decide(AttentionState::Watching, &open, &neutral_reading(), 3.0, t0)
            .expect("follow burst");
        arb.note_issued(&follow, t0);

        // Session gone, but the wave reaction is still inside the window
        // stamped by the follow.
        arb.decide(
            AttentionState::NoUser,
            &absent(),
            &neutral_reading(),
            1.0,
            t0 + Duration::from_millis(600),
        );
        let wave = with_gesture(watching(0.5, 0.3), HandGesture::Wave);
        let gated = arb.decide(
            AttentionState::Watching,
            &wave,
            &neutral_reading(),
            1.6,
            t0 + Duration::from_millis(700),
        );
        assert_eq!(gated, None);

        let reacted = arb.decide(
            AttentionState::Watching,
            &wave,
            &neutral_reading(),
            1.6,
            t0 + Duration::from_millis(3100),
        );
        assert_eq!(reacted, Some(ActionRequest::Happy { intensity: 0.7 }));
    }

    #[test]
    fn wave_and_come_here_react_under_the_global_gate() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        let wave = arb.decide(
            AttentionState::Watching,
            &with_gesture(watching(0.5, 0.3), HandGesture::Wave),
            &neutral_reading(),
            1.6,
            t0,
        );
        assert_eq!(wave, Some(ActionRequest::Happy { intensity: 0.7 }));
        arb.note_issued(&wave.unwrap(), t0);

        let gated = arb.decide(
            AttentionState::Watching,
            &with_gesture(watching(0.5, 0.3), HandGesture::ComeHere),
            &neutral_reading(),
            2.2,
            t0 + Duration::from_secs(1),
        );
        assert_eq!(gated, None);

        let beckoned = arb.decide(
            AttentionState::Watching,
            &with_gesture(watching(0.5, 0.3), HandGesture::ComeHere),
            &neutral_reading(),
            2.8,
            t0 + Duration::from_millis(3500),
        );
        assert_eq!(beckoned, Some(ActionRequest::Curious { intensity: 0.8 }));
    }

    #[test]
    fn ignored_robot_seeks_attention_every_thirty_seconds() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        let first = arb.decide(
            AttentionState::NotWatching,
            &looking_away(),
            &neutral_reading(),
            2.0,
            t0,
        );
        assert_eq!(first, Some(ActionRequest::SeekAttention { intensity: 0.5 }));
        arb.note_issued(&first.unwrap(), t0);

        let quiet = arb.decide(
            AttentionState::NotWatching,
            &looking_away(),
            &neutral_reading(),
            2.0,
            t0 + Duration::from_secs(10),
        );
        assert_eq!(quiet, None);

        let again = arb.decide(
            AttentionState::NotWatching,
            &looking_away(),
            &neutral_reading(),
            2.0,
            t0 + Duration::from_secs(31),
        );
        assert_eq!(again, Some(ActionRequest::SeekAttention { intensity: 0.5 }));
    }

    #[test]
    fn hidden_face_accrues_toward_a_search() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        // Caller-supplied state can disagree with the percept when an
        // upstream tracker holds attention through a detection gap.
        let mut issued = Vec::new();
        for i in 0..16 {
            let request = arb.decide(
                AttentionState::NotWatching,
                &absent(),
                &neutral_reading(),
                2.0,
                t0 + TICK * i,
            );
            if let Some(request) = request {
                arb.note_issued(&request, t0 + TICK * i);
                issued.push((i, request));
            }
        }
        assert_eq!(issued.len(), 1);
        let (tick, request) = issued[0];
        assert_eq!(tick, 15, "first frame past the half-second threshold");
        assert!(matches!(request, ActionRequest::Search { .. }));
    }

    #[test]
    fn absent_user_triggers_a_single_search() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let mut searches = Vec::new();

        for i in 0..40u32 {
            let now = t0 + TICK * i;
            if let Some(request) = arb.decide(
                AttentionState::NoUser,
                &absent(),
                &neutral_reading(),
                1.0,
                now,
            ) {
                arb.note_issued(&request, now);
                if matches!(request, ActionRequest::Search { .. }) {
                    searches.push(i);
                }
            }
        }
        assert_eq!(searches, vec![30], "one search, right past the threshold");
        assert!(arb.search_pending(), "the counter keeps re-arming the flag");
    }

    #[test]
    fn long_absence_paces_idles_searches_and_the_global_gate() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let mut idles = Vec::new();
        let mut searches = Vec::new();
        let mut actions = Vec::new();

        // 40 s of empty room at 30 fps.
        for i in 0..1200u32 {
            let now = t0 + TICK * i;
            if let Some(request) = arb.decide(
                AttentionState::NoUser,
                &absent(),
                &neutral_reading(),
                1.0,
                now,
            ) {
                arb.note_issued(&request, now);
                actions.push(now);
                match request {
                    ActionRequest::Idle { .. } => idles.push(now),
                    ActionRequest::Search { .. } => searches.push(now),
                    other => panic!("unexpected action while alone: {other}"),
                }
            }
        }

        assert!(idles.len() >= 2);
        assert!(searches.len() >= 2);
        assert_eq!(
            idles[0].duration_since(t0),
            TICK * 149,
            "first idle lands at the accumulation threshold"
        );
        for pair in actions.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(3));
        }
        for pair in idles.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(12));
        }
        for pair in searches.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(15));
        }
    }

    #[test]
    fn a_watching_tick_clears_the_absence_bookkeeping() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        for i in 0..20u32 {
            arb.decide(
                AttentionState::NoUser,
                &absent(),
                &neutral_reading(),
                1.0,
                t0 + TICK * i,
            );
        }
        let greeting = arb.decide(
            AttentionState::Watching,
            &watching(0.5, 0.3),
            &neutral_reading(),
            1.6,
            t0 + TICK * 20,
        );
        assert!(matches!(greeting, Some(ActionRequest::Happy { .. })));
        arb.note_issued(&greeting.unwrap(), t0 + TICK * 20);

        // The earlier 20 absent frames no longer count toward the search
        // threshold.
        for i in 21..46u32 {
            let request = arb.decide(
                AttentionState::NoUser,
                &absent(),
                &neutral_reading(),
                1.0,
                t0 + TICK * i,
            );
            assert_eq!(request, None);
        }
        assert!(!arb.search_pending());
    }

    #[test]
    fn decisions_stay_free_until_the_engine_confirms_them() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let wave = with_gesture(watching(0.5, 0.3), HandGesture::Wave);

        let first = arb.decide(AttentionState::Watching, &wave, &neutral_reading(), 1.6, t0);
        assert!(first.is_some());

        // Nothing was committed, so the same decision is still available.
        let retry = arb.decide(
            AttentionState::Watching,
            &wave,
            &neutral_reading(),
            1.6,
            t0 + TICK,
        );
        assert_eq!(retry, first);

        arb.note_issued(&retry.unwrap(), t0 + TICK);
        let gated = arb.decide(
            AttentionState::Watching,
            &wave,
            &neutral_reading(),
            1.6,
            t0 + TICK * 2,
        );
        assert_eq!(gated, None);
    }

    #[test]
    fn gaze_without_face_coordinates_still_greets() {
        let mut arb = arbiter();
        let t0 = Instant::now();
        let percept = Percept {
            presence: true,
            watching: true,
            face_center_x: None,
            distance: None,
            emotions: EmotionScores::neutral_baseline(),
            gesture: None,
        };
        let request = arb.decide(AttentionState::Watching, &percept, &neutral_reading(), 1.6, t0);
        assert!(matches!(request, Some(ActionRequest::Happy { .. })));
    }
}
