//! `emobot-engine` – behavior arbitration and motor sequencing.
//!
//! The decision half of the robot: consumes normalized percepts from
//! `emobot-perception`, picks at most one action per control tick, and
//! plays the action's motor choreography through `emobot-hal` on a
//! dedicated worker, with a circuit breaker that swaps in simulated
//! execution when the hardware link dies.
//!
//! # Modules
//!
//! - [`engine`] – [`Engine`]: the per-tick pipeline gluing everything
//!   together.
//! - [`arbiter`] – [`BehaviorArbiter`]: the priority-ordered decision rules,
//!   following sessions, and cooldown clocks.
//! - [`sequencer`] – [`MotorSequencer`]: the single-worker command queue
//!   that owns the motor driver.
//! - [`script`] – the fixed choreography behind every request.
//! - [`breaker`] – [`CircuitBreaker`]: three strikes and the hardware is
//!   out.
//! - [`bus`] – [`TelemetryBus`]: per-tick snapshot fan-out.

pub mod arbiter;
pub mod breaker;
pub mod bus;
pub mod engine;
pub mod script;
pub mod sequencer;

pub use arbiter::BehaviorArbiter;
pub use breaker::CircuitBreaker;
pub use bus::TelemetryBus;
pub use engine::Engine;
pub use script::{Motion, Step};
pub use sequencer::{Dispatch, MotorSequencer, SequencerHandle};
