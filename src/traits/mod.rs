//! Trait definitions for the collaborators around the decode core.
//!
//! # Submodules
//!
//! - `gpio`: pin reservation, input setup and edge binding
//! - `registry`: named read/write endpoint registration
//!
//! Concrete implementations live in [`crate::hal`] (GPIO backends and the
//! in-memory registry) and `crate::services` (HTTP registry, `web` feature).

pub mod gpio;
pub mod registry;

pub use gpio::*;
pub use registry::*;
