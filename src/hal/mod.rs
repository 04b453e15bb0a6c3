//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `local`: In-process device registry
//! - `mock`: Test doubles for GPIO and device registration (requires `std`)
//! - `polled`: Edge detection by sampling any `embedded-hal` input pin
//! - `rpi`: Raspberry Pi GPIO interrupts via rppal (requires `rpi` feature)
//! - `esp32`: ESP32 polled inputs via esp-idf-hal (requires `esp32` feature)

pub mod local;

#[cfg(feature = "std")]
pub mod mock;

pub mod polled;

#[cfg(feature = "rpi")]
pub mod rpi;

#[cfg(feature = "esp32")]
pub mod esp32;

#[cfg(feature = "std")]
pub use mock::*;

pub use local::{LocalHandle, LocalRegistry, LocalRegistryError};
pub use polled::{EdgePoller, PolledLines};
