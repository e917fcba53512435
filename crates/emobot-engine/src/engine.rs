//! The per-tick control pipeline.
//!
//! [`Engine`] wires the whole stack together: detector frame in, one
//! [`TickTelemetry`] snapshot out, and at most one action handed to the
//! sequencer along the way. The tick itself never blocks; motor sequences
//! run on the sequencer's worker task.
//!
//! Order within a tick: normalize the frame, stabilize emotions, classify
//! attention and step the interaction level, let the arbiter decide, then
//! dispatch. Cooldowns are only committed when the sequencer accepts the
//! request, so a decision dropped by a busy worker stays available on the
//! next tick.

use std::time::Instant;

use chrono::Utc;
use emobot_hal::MotorDriver;
use emobot_perception::{AttentionTracker, DetectorFrame, EmotionStabilizer, Percept};
use emobot_types::{BreakerState, TickTelemetry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::arbiter::BehaviorArbiter;
use crate::bus::TelemetryBus;
use crate::sequencer::{Dispatch, MotorSequencer, SequencerHandle};

pub struct Engine {
    stabilizer: EmotionStabilizer,
    tracker: AttentionTracker,
    arbiter: BehaviorArbiter,
    sequencer: SequencerHandle,
    worker: JoinHandle<()>,
    bus: TelemetryBus,
}

impl Engine {
    /// Assemble the pipeline around `driver` and spawn the sequencer
    /// worker; must be called within a Tokio runtime.
    ///
    /// A fixed `seed` makes every random choice in the stack (emotion
    /// jitter, curiosity rolls, idle fidgets, seek twitches) reproducible.
    pub fn new(driver: Box<dyn MotorDriver>, seed: Option<u64>) -> Self {
        let [stabilizer_rng, arbiter_rng, sequencer_rng] = rngs(seed);
        let (sequencer, worker) = MotorSequencer::spawn(driver, sequencer_rng);
        Self {
            stabilizer: EmotionStabilizer::new(stabilizer_rng),
            tracker: AttentionTracker::default(),
            arbiter: BehaviorArbiter::new(arbiter_rng),
            sequencer,
            worker,
            bus: TelemetryBus::default(),
        }
    }

    /// Telemetry fan-out for status displays.
    pub fn telemetry(&self) -> &TelemetryBus {
        &self.bus
    }

    /// Run one control tick against the wall clock.
    pub fn tick(&mut self, frame: &DetectorFrame) -> TickTelemetry {
        self.tick_at(frame, Instant::now())
    }

    /// Run one control tick at an explicit instant. Split out from
    /// [`tick`](Self::tick) so scenarios can drive a synthetic timeline.
    pub fn tick_at(&mut self, frame: &DetectorFrame, now: Instant) -> TickTelemetry {
        let percept = Percept::from_frame(frame);
        let state = AttentionTracker::classify(percept.presence, percept.watching);
        let reading = self.stabilizer.update(&percept.emotions, now);
        let engagement = self.tracker.update(state, &reading.active);

        let decision = self
            .arbiter
            .decide(state, &percept, &reading, engagement.level, now);
        let mut issued = None;
        if let Some(request) = decision {
            match self.sequencer.dispatch(request) {
                Dispatch::Queued => {
                    self.arbiter.note_issued(&request, now);
                    issued = Some(request);
                }
                Dispatch::Dropped => {
                    debug!(action = %request, "decision dropped, will reconsider next tick");
                }
            }
        }

        let snapshot = TickTelemetry {
            timestamp: Utc::now(),
            attention: state,
            dominant: reading.dominant,
            confidence: reading.confidence,
            emotion_duration_ms: reading.duration.as_millis() as u64,
            active: reading.active.clone(),
            interaction_level: engagement.level,
            engagement_target: engagement.target,
            distance_band: percept.distance.map(|d| d.band),
            following: self.arbiter.following(),
            search_pending: self.arbiter.search_pending(),
            breaker: if self.sequencer.is_degraded() {
                BreakerState::Degraded
            } else {
                BreakerState::Healthy
            },
            last_action: issued,
        };
        self.bus.publish(&snapshot);
        snapshot
    }

    /// Close the sequencer queue and wait for the worker to finish its
    /// current sequence.
    pub async fn shutdown(self) {
        drop(self.sequencer);
        let _ = self.worker.await;
    }
}

fn rngs(seed: Option<u64>) -> [StdRng; 3] {
    match seed {
        Some(s) => [
            StdRng::seed_from_u64(s),
            StdRng::seed_from_u64(s.wrapping_add(1)),
            StdRng::seed_from_u64(s.wrapping_add(2)),
        ],
        None => [
            StdRng::from_entropy(),
            StdRng::from_entropy(),
            StdRng::from_entropy(),
        ],
    }
}
