//! ESP32 GPIO backend using `esp-idf-hal`.
//!
//! Lines are plain input `PinDriver`s with internal pull-ups, sampled by the
//! shared [`EdgePoller`](super::polled::EdgePoller). Drive them with
//! [`PolledLines::poll_burst`] using `Ets` for the spacing, then block for
//! at least one FreeRTOS tick. Sub-tick `thread::sleep` spins on esp-idf and
//! starves the idle task.
//!
//! # Example
//!
//! ```ignore
//! use esp_idf_hal::gpio::IOPin;
//! use esp_idf_hal::peripherals::Peripherals;
//! use rs_encoders::hal::esp32;
//!
//! let p = Peripherals::take()?;
//! let lines = esp32::input_lines([
//!     p.pins.gpio6.downgrade(),
//!     p.pins.gpio7.downgrade(),
//! ])?;
//! ```

use esp_idf_hal::gpio::{AnyIOPin, Input, Pin, PinDriver, Pull};
use esp_idf_hal::sys::EspError;

use super::polled::PolledLines;

/// Input driver type used for every line.
pub type Esp32Input = PinDriver<'static, AnyIOPin, Input>;

/// Polled line pool over ESP32 GPIOs.
pub type Esp32Lines = PolledLines<Esp32Input>;

/// Configures `pins` as pulled-up inputs and pools them by GPIO number.
///
/// # Errors
///
/// Returns an error if GPIO initialization fails.
pub fn input_lines(pins: impl IntoIterator<Item = AnyIOPin>) -> Result<Esp32Lines, EspError> {
    let mut inputs = alloc::vec::Vec::new();
    for pin in pins {
        let number = pin.pin() as u32;
        let mut driver = PinDriver::input(pin)?;
        driver.set_pull(Pull::Up)?;
        inputs.push((number, driver));
    }
    Ok(PolledLines::new(inputs))
}
