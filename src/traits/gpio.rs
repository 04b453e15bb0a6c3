//! Digital-IO seam: pin reservation, input setup and edge binding.
//!
//! | Step | Method |
//! |------|--------|
//! | reserve the physical pin | [`EdgeLines::reserve`] |
//! | configure it as an input | [`EdgeLines::configure_input`] |
//! | deliver rising and falling edges to a handler | [`EdgeLines::bind_edges`] |
//! | undo all of the above | [`EdgeLines::release`] |
//!
//! For testing, use [`crate::hal::MockGpio`]. On a Raspberry Pi use
//! `hal::rpi::RpiLines` (requires `rpi` feature); on ESP32 use
//! `hal::esp32::Esp32Lines` (requires `esp32` feature).

use crate::engine::EdgeHandler;

/// Stage of line acquisition, used in startup errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStage {
    /// Pin reservation.
    Reserve,
    /// Direction setup.
    Configure,
    /// Edge notification binding.
    Bind,
}

impl LineStage {
    /// Returns the stage as a short verb phrase.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineStage::Reserve => "reserve pin",
            LineStage::Configure => "configure input",
            LineStage::Bind => "bind edge notifications",
        }
    }
}

impl core::fmt::Display for LineStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge-notification capable digital inputs.
///
/// # Implementation Notes
///
/// - `bind_edges` must arrange for `handler.fire(level)` to be called once
///   per rising and once per falling transition, with the line's new level
/// - handlers may be called from any thread or interrupt context
/// - after `release` returns, the handler must not be called again
pub trait EdgeLines {
    /// Handle for one reserved line.
    type Line;
    /// Error type for line operations.
    type Error: core::fmt::Display;

    /// Reserves physical pin `pin`.
    fn reserve(&mut self, pin: u32) -> Result<Self::Line, Self::Error>;

    /// Configures a reserved line as an input.
    fn configure_input(&mut self, line: &mut Self::Line) -> Result<(), Self::Error>;

    /// Starts delivering edges of `line` to `handler`.
    fn bind_edges(&mut self, line: &mut Self::Line, handler: EdgeHandler)
        -> Result<(), Self::Error>;

    /// Stops edge delivery and frees the pin.
    fn release(&mut self, line: Self::Line);

    /// Runs reserve, configure and bind in order.
    ///
    /// On failure the line is released again and the failing stage is
    /// returned with the error.
    fn acquire(
        &mut self,
        pin: u32,
        handler: EdgeHandler,
    ) -> Result<Self::Line, (LineStage, Self::Error)> {
        let mut line = self.reserve(pin).map_err(|e| (LineStage::Reserve, e))?;
        if let Err(e) = self.configure_input(&mut line) {
            self.release(line);
            return Err((LineStage::Configure, e));
        }
        if let Err(e) = self.bind_edges(&mut line, handler) {
            self.release(line);
            return Err((LineStage::Bind, e));
        }
        Ok(line)
    }
}
