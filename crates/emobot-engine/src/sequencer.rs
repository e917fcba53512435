//! Motor action sequencer.
//!
//! A single worker task owns the [`MotorDriver`], the [`CircuitBreaker`] and
//! the choreography RNG, and is the only code in the process that touches
//! the motors. Requests arrive over a bounded channel with room for exactly
//! one waiting action: while a sequence is running, the next discrete
//! request parks in that slot, and per-tick repeats (`Follow`, servo
//! `Align`) are dropped instead, because by the time the worker got to them
//! they would steer at a stale target.
//!
//! A drive fault inside a script skips the remaining drive commands but
//! still sleeps out the remaining pauses, so a faulted action occupies the
//! worker for exactly as long as a clean one. Once the breaker trips, every
//! script runs the same way from the start: full timing, zero hardware
//! calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use emobot_hal::MotorDriver;
use emobot_types::{ActionRequest, EmoError, TurnDirection};
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::breaker::CircuitBreaker;
use crate::script::{self, Motion, Step};

/// Outcome of handing a request to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The request was accepted and will run, possibly after the current
    /// sequence finishes.
    Queued,
    /// The worker was busy and the request was discarded.
    Dropped,
}

/// Cheap front end held by the engine. Dispatching never blocks.
pub struct SequencerHandle {
    tx: mpsc::Sender<ActionRequest>,
    busy: Arc<AtomicBool>,
    degraded: Arc<AtomicBool>,
}

impl SequencerHandle {
    /// Offer `request` to the worker.
    ///
    /// Droppable requests are discarded while the worker is mid-sequence or
    /// the queue slot is taken. Discrete requests wait in the slot; if even
    /// the slot is full they are discarded too, and the caller keeps its
    /// cooldowns unburnt so the decision can be remade next tick.
    pub fn dispatch(&self, request: ActionRequest) -> Dispatch {
        if request.droppable() && self.busy.load(Ordering::Acquire) {
            debug!(action = %request, "sequencer busy, dropping repeat");
            return Dispatch::Dropped;
        }
        match self.tx.try_send(request) {
            Ok(()) => Dispatch::Queued,
            Err(TrySendError::Full(req)) => {
                if req.droppable() {
                    debug!(action = %req, "sequencer busy, dropping repeat");
                } else {
                    warn!(action = %req, "sequencer backlog full, discarding");
                }
                Dispatch::Dropped
            }
            Err(TrySendError::Closed(req)) => {
                warn!(action = %req, "sequencer worker gone, discarding");
                Dispatch::Dropped
            }
        }
    }

    /// True once the breaker has tripped and execution went fully simulated.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }
}

/// The worker side: driver, breaker and RNG behind the channel.
pub struct MotorSequencer {
    driver: Box<dyn MotorDriver>,
    breaker: CircuitBreaker,
    rng: StdRng,
    degraded: Arc<AtomicBool>,
}

impl MotorSequencer {
    /// Spawn the worker task. Must be called within a Tokio runtime.
    pub fn spawn(driver: Box<dyn MotorDriver>, rng: StdRng) -> (SequencerHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(1);
        let busy = Arc::new(AtomicBool::new(false));
        let degraded = Arc::new(AtomicBool::new(false));
        let mut sequencer = MotorSequencer {
            driver,
            breaker: CircuitBreaker::new(),
            rng,
            degraded: Arc::clone(&degraded),
        };
        let worker_busy = Arc::clone(&busy);
        let worker = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                worker_busy.store(true, Ordering::Release);
                sequencer.execute(request).await;
                worker_busy.store(false, Ordering::Release);
            }
            debug!("sequencer channel closed, worker exiting");
        });
        (SequencerHandle { tx, busy, degraded }, worker)
    }

    /// Run one request's script to completion.
    async fn execute(&mut self, request: ActionRequest) {
        let steps = script::build(&request, &mut self.rng);
        let simulated = self.breaker.is_degraded();
        info!(
            action = %request,
            motor = self.driver.id(),
            simulated,
            "executing sequence"
        );

        let mut live = !simulated;
        for step in steps {
            match step {
                Step::Drive(motion) if live => match self.drive(motion) {
                    Ok(()) => self.breaker.record_success(),
                    Err(e) => {
                        warn!(action = %request, error = %e, "drive fault, finishing on the clock");
                        self.breaker.record_fault();
                        live = false;
                    }
                },
                Step::Drive(_) => {}
                Step::Pause(d) => time::sleep(d).await,
            }
        }
        self.degraded
            .store(self.breaker.is_degraded(), Ordering::Release);
    }

    fn drive(&mut self, motion: Motion) -> Result<(), EmoError> {
        match motion {
            Motion::Forward(speed) => self.driver.forward(speed),
            Motion::Backward(speed) => self.driver.backward(speed),
            Motion::Turn(TurnDirection::Left) => self.driver.left(),
            Motion::Turn(TurnDirection::Right) => self.driver.right(),
            Motion::Stop => self.driver.stop(),
        }
    }
}
