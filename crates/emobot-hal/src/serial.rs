//! Line-protocol driver for the serial motor controller.
//!
//! The controller speaks newline-terminated ASCII: single-letter direction
//! commands (`F`, `B`, `L`, `R`, `S`), a bare decimal to preset the speed
//! level, and `?` as a liveness probe. Every command is answered with one
//! acknowledgement line. [`SerialMotor`] is generic over the byte stream so
//! tests can drive it with in-memory buffers; production wraps the tty
//! device node, which must already be configured (raw mode, 115200 8N1).

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use emobot_types::EmoError;
use tracing::{debug, info};

use crate::motor::MotorDriver;

/// Highest speed level the controller accepts.
const MAX_SPEED: u8 = 100;

/// Blocking request/response driver over a serial byte stream.
pub struct SerialMotor<T: Read + Write> {
    id: String,
    port: BufReader<T>,
}

impl SerialMotor<File> {
    /// Open the controller at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EmoError::Configuration`] when the device node cannot be
    /// opened for read/write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EmoError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                EmoError::Configuration(format!(
                    "cannot open motor port {}: {e}",
                    path.display()
                ))
            })?;
        info!(port = %path.display(), "motor controller port opened");
        Ok(Self::from_stream(format!("serial:{}", path.display()), file))
    }
}

impl<T: Read + Write> SerialMotor<T> {
    /// Wrap an already-open byte stream.
    pub fn from_stream(id: impl Into<String>, stream: T) -> Self {
        Self {
            id: id.into(),
            port: BufReader::new(stream),
        }
    }

    /// Ask the controller for its status line. Used at startup to verify a
    /// live controller is on the other end, not just an openable device.
    pub fn status(&mut self) -> Result<String, EmoError> {
        self.send("?")
    }

    /// One command/response exchange: write `cmd` + newline, read one
    /// acknowledgement line.
    fn send(&mut self, cmd: &str) -> Result<String, EmoError> {
        let wire = format!("{cmd}\n");
        let written = {
            let stream = self.port.get_mut();
            stream
                .write_all(wire.as_bytes())
                .and_then(|()| stream.flush())
        };
        if let Err(e) = written {
            return Err(self.fault(format!("write of `{cmd}` failed: {e}")));
        }

        let mut ack = String::new();
        match self.port.read_line(&mut ack) {
            Ok(0) => Err(self.fault(format!("no acknowledgement for `{cmd}`"))),
            Ok(_) => {
                let ack = ack.trim().to_string();
                debug!(cmd, ack = %ack, "serial exchange");
                Ok(ack)
            }
            Err(e) => Err(self.fault(format!("read after `{cmd}` failed: {e}"))),
        }
    }

    fn fault(&self, details: String) -> EmoError {
        EmoError::HardwareFault {
            component: self.id.clone(),
            details,
        }
    }
}

impl<T: Read + Write + Send> MotorDriver for SerialMotor<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn forward(&mut self, speed: u8) -> Result<(), EmoError> {
        self.send(&speed.min(MAX_SPEED).to_string())?;
        self.send("F")?;
        Ok(())
    }

    fn backward(&mut self, speed: u8) -> Result<(), EmoError> {
        self.send(&speed.min(MAX_SPEED).to_string())?;
        self.send("B")?;
        Ok(())
    }

    fn left(&mut self) -> Result<(), EmoError> {
        self.send("L")?;
        Ok(())
    }

    fn right(&mut self) -> Result<(), EmoError> {
        self.send("R")?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EmoError> {
        self.send("S")?;
        Ok(())
    }
}
