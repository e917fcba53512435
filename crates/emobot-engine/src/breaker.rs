//! Motor-link circuit breaker.
//!
//! The sequencer reports the outcome of every primitive motor call here.
//! Three consecutive faults flip the breaker from [`BreakerState::Healthy`]
//! to [`BreakerState::Degraded`]; a successful call in between resets the
//! count. Degradation is permanent for the lifetime of the process: once a
//! link has failed three times in a row it is written off and every later
//! sequence runs against the simulator instead.

use emobot_types::BreakerState;
use tracing::{error, warn};

/// Consecutive faults required to trip the breaker.
const TRIP_THRESHOLD: u32 = 3;

/// Tracks the health of the motor link from observed call outcomes.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: BreakerState,
    consecutive_faults: u32,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            state: BreakerState::Healthy,
            consecutive_faults: 0,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn is_degraded(&self) -> bool {
        self.state == BreakerState::Degraded
    }

    /// Record a failed motor call. The third consecutive fault trips the
    /// breaker for good.
    pub fn record_fault(&mut self) {
        if self.is_degraded() {
            return;
        }
        self.consecutive_faults += 1;
        warn!(consecutive = self.consecutive_faults, "motor fault recorded");
        if self.consecutive_faults >= TRIP_THRESHOLD {
            self.state = BreakerState::Degraded;
            error!(
                threshold = TRIP_THRESHOLD,
                "motor link degraded, switching to simulated execution"
            );
        }
    }

    /// Record a successful motor call, resetting the consecutive-fault
    /// count. Has no effect once the breaker has tripped.
    pub fn record_success(&mut self) {
        if self.is_degraded() {
            return;
        }
        self.consecutive_faults = 0;
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
