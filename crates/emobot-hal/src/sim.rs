//! Logging simulator used when no motor controller is attached.
//!
//! [`SimMotor`] accepts every primitive, logs it, and counts it, so the
//! whole engine can run headless with timing identical to the hardware path
//! (the sequencer owns all pacing; a primitive exchange is near-instant in
//! both worlds).

use emobot_types::EmoError;
use tracing::debug;

use crate::motor::MotorDriver;

/// Drop-in replacement for the hardware driver. Always succeeds.
#[derive(Default)]
pub struct SimMotor {
    commands: u64,
}

impl SimMotor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitives issued so far.
    pub fn commands_issued(&self) -> u64 {
        self.commands
    }
}

impl MotorDriver for SimMotor {
    fn id(&self) -> &str {
        "sim"
    }

    fn forward(&mut self, speed: u8) -> Result<(), EmoError> {
        self.commands += 1;
        debug!(speed, "sim motor: forward");
        Ok(())
    }

    fn backward(&mut self, speed: u8) -> Result<(), EmoError> {
        self.commands += 1;
        debug!(speed, "sim motor: backward");
        Ok(())
    }

    fn left(&mut self) -> Result<(), EmoError> {
        self.commands += 1;
        debug!("sim motor: left");
        Ok(())
    }

    fn right(&mut self) -> Result<(), EmoError> {
        self.commands += 1;
        debug!("sim motor: right");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EmoError> {
        self.commands += 1;
        debug!("sim motor: stop");
        Ok(())
    }
}
