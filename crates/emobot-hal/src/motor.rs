//! Generic `MotorDriver` trait for the drive base.
//!
//! Drivers implement this trait and are handed to the motor sequencer, which
//! is the only component that ever issues primitive commands. Everything
//! above the sequencer talks in behavior terms, so drivers can be swapped
//! without touching decision logic.

use emobot_types::EmoError;

/// The primitive command surface of the drive base.
///
/// One call is one request/response exchange with the controller: it returns
/// once the controller acknowledges, or fails with
/// [`EmoError::HardwareFault`]. Pacing between calls (how long a motion
/// lasts) is the caller's job – the controller latches each command until
/// the next one arrives.
pub trait MotorDriver: Send {
    /// Stable identifier for logs, e.g. `"serial:/dev/ttyUSB0"` or `"sim"`.
    fn id(&self) -> &str;

    /// Drive forward at `speed` (0–100).
    ///
    /// # Errors
    ///
    /// Returns [`EmoError::HardwareFault`] when the exchange with the
    /// controller fails.
    fn forward(&mut self, speed: u8) -> Result<(), EmoError>;

    /// Drive backward at `speed` (0–100).
    fn backward(&mut self, speed: u8) -> Result<(), EmoError>;

    /// Rotate left in place.
    fn left(&mut self) -> Result<(), EmoError>;

    /// Rotate right in place.
    fn right(&mut self) -> Result<(), EmoError>;

    /// Halt all motion.
    fn stop(&mut self) -> Result<(), EmoError>;
}
