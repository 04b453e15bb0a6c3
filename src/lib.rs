//! # rs-encoders
//!
//! Decodes several rotary quadrature encoders wired to digital inputs and
//! exposes their accumulated positions through a read/reset endpoint.
//!
//! ## Features
//!
//! - **Table-driven decode**: every edge is folded into its encoder's 2-bit
//!   state and the step is looked up in a fixed 4×4 transition table
//! - **Lock-free counters**: per-encoder atomic state and counters; reads and
//!   resets never stall edge processing
//! - **Simple mode**: one line per encoder, every edge counts +1
//! - **Endpoint**: `4 * N` byte little-endian read, any write resets
//! - **Backends**: Raspberry Pi interrupts (rppal), polled `embedded-hal`
//!   pins, ESP32, and mocks for testing
//!
//! ## Architecture
//!
//! - `table` - Transition table, channels and levels
//! - `engine` - Decode engine and per-line edge handlers
//! - `store` - Count store and snapshots
//! - `device` - Read/write endpoint
//! - `config` - Encoder count, mode and pin assignment
//! - `service` - Startup, rollback and teardown
//! - `traits` - GPIO and registry seams
//! - `hal` - Concrete backends (mock for testing, rpi/esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_encoders::{CounterConfig, EncoderService, Level};
//! use rs_encoders::hal::{MockGpio, MockRegistry};
//!
//! let gpio = MockGpio::new();
//! let service =
//!     EncoderService::start(&CounterConfig::default(), gpio.clone(), MockRegistry::new())
//!         .unwrap();
//!
//! // One full cycle on encoder 1 (pins 23/24)
//! for (pin, level) in [(24, Level::High), (23, Level::High), (24, Level::Low), (23, Level::Low)] {
//!     gpio.set_level(pin, level);
//! }
//! assert_eq!(service.snapshot().counts, vec![0, 4]);
//!
//! service.device().write(b"");
//! assert_eq!(service.snapshot().counts, vec![0, 0]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Encoder count, mode and pin assignment.
pub mod config;
/// Read/write endpoint over the counters.
pub mod device;
/// Edge decode engine.
pub mod engine;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Service startup and teardown.
pub mod service;
/// Per-encoder counters.
pub mod store;
/// Quadrature transition table.
pub mod table;
/// Collaborator traits for GPIO and device registration.
pub mod traits;

/// Network endpoint for the counters (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use config::{parse_pins, ConfigError, CounterConfig, EncoderLines, Mode};
pub use device::{AccessError, CountDevice};
pub use engine::{DecodeEngine, EdgeHandler, LineInfo, LineMap};
pub use service::{EncoderService, StartupError};
pub use store::{CountStore, Snapshot};
pub use table::{increment, Channel, Level, TRANSITION_TABLE};
pub use traits::{DeviceRegistry, EdgeLines, LineStage};
