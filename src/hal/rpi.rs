//! Raspberry Pi GPIO backend using `rppal`.
//!
//! Each bound line gets an rppal asynchronous interrupt on both edges. rppal
//! runs one interrupt thread per pin, so channel A and channel B of the same
//! encoder are delivered from different threads; the decode engine
//! serialises them per encoder.
//!
//! Pin numbers are BCM GPIO numbers (17 is physical header pin 11).
//!
//! # Example
//!
//! ```ignore
//! use rs_encoders::hal::rpi::RpiLines;
//! use rs_encoders::hal::MockRegistry;
//! use rs_encoders::{CounterConfig, EncoderService};
//!
//! let service = EncoderService::start(
//!     &CounterConfig::default(),
//!     RpiLines::new()?,
//!     MockRegistry::new(),
//! )?;
//! ```

use rppal::gpio::{Gpio, InputPin, Level as PinLevel, Pin, Trigger};

use crate::engine::EdgeHandler;
use crate::table::Level;
use crate::traits::EdgeLines;

/// Errors from [`RpiLines`].
#[derive(Debug, thiserror::Error)]
pub enum RpiError {
    /// Pin number outside the BCM range.
    #[error("pin {0} is not a valid BCM GPIO number")]
    InvalidPin(u32),
    /// The line is not in the expected state.
    #[error("line for pin {0} is not configured")]
    NotConfigured(u32),
    /// rppal error.
    #[error(transparent)]
    Gpio(#[from] rppal::gpio::Error),
}

impl From<PinLevel> for Level {
    fn from(level: PinLevel) -> Self {
        match level {
            PinLevel::Low => Level::Low,
            PinLevel::High => Level::High,
        }
    }
}

/// A reserved GPIO line.
pub struct RpiLine {
    number: u32,
    reserved: Option<Pin>,
    input: Option<InputPin>,
}

impl RpiLine {
    /// BCM pin number.
    pub fn pin(&self) -> u32 {
        self.number
    }
}

/// GPIO lines on the Raspberry Pi header.
pub struct RpiLines {
    gpio: Gpio,
}

impl RpiLines {
    /// Opens the GPIO peripheral.
    pub fn new() -> Result<Self, RpiError> {
        Ok(Self { gpio: Gpio::new()? })
    }
}

impl EdgeLines for RpiLines {
    type Line = RpiLine;
    type Error = RpiError;

    fn reserve(&mut self, pin: u32) -> Result<RpiLine, RpiError> {
        let bcm = u8::try_from(pin).map_err(|_| RpiError::InvalidPin(pin))?;
        let reserved = self.gpio.get(bcm)?;
        Ok(RpiLine {
            number: pin,
            reserved: Some(reserved),
            input: None,
        })
    }

    fn configure_input(&mut self, line: &mut RpiLine) -> Result<(), RpiError> {
        let pin = line
            .reserved
            .take()
            .ok_or(RpiError::NotConfigured(line.number))?;
        line.input = Some(pin.into_input());
        Ok(())
    }

    fn bind_edges(&mut self, line: &mut RpiLine, handler: EdgeHandler) -> Result<(), RpiError> {
        let input = line
            .input
            .as_mut()
            .ok_or(RpiError::NotConfigured(line.number))?;
        handler.prime(input.read().into());
        input.set_async_interrupt(Trigger::Both, move |level: PinLevel| {
            handler.fire(level.into());
        })?;
        Ok(())
    }

    fn release(&mut self, line: RpiLine) {
        if let Some(mut input) = line.input {
            if let Err(e) = input.clear_async_interrupt() {
                tracing::warn!(pin = line.number, error = %e, "failed to clear interrupt");
            }
        }
    }
}
