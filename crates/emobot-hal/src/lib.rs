//! `emobot-hal` – Hardware access layer.
//!
//! The single seam between behavior logic and physical motors. The motor
//! sequencer holds exactly one [`MotorDriver`] and is its only caller.
//!
//! # Modules
//!
//! - [`motor`] – [`MotorDriver`][motor::MotorDriver]: the primitive command
//!   surface (`forward`/`backward`/`left`/`right`/`stop`) every drive-base
//!   driver implements.
//! - [`serial`] – [`SerialMotor`][serial::SerialMotor]: newline-delimited
//!   ASCII line protocol over any byte stream; production wraps the tty
//!   device node.
//! - [`sim`] – [`SimMotor`][sim::SimMotor]: logging simulator used when no
//!   controller is reachable at startup.

use tracing::{info, warn};

pub mod motor;
pub mod serial;
pub mod sim;

pub use motor::MotorDriver;
pub use serial::SerialMotor;
pub use sim::SimMotor;

/// Open the motor controller at `port`, falling back to the simulator when
/// the hardware is unavailable or unresponsive.
///
/// The fallback is logged exactly once, here; afterwards the simulator is
/// indistinguishable from real hardware to everything upstream.
pub fn connect_or_simulate(port: &str) -> Box<dyn MotorDriver> {
    match SerialMotor::open(port).and_then(|mut m| m.status().map(|_| m)) {
        Ok(motor) => {
            info!(port, "motor controller connected");
            Box::new(motor)
        }
        Err(e) => {
            warn!(port, error = %e, "motor hardware unavailable, running simulated");
            Box::new(SimMotor::new())
        }
    }
}
