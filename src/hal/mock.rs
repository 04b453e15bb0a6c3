//! Mock implementations for testing without hardware.
//!
//! Both mocks keep their state behind an `Arc<Mutex<_>>`, so a test can
//! hand one clone to [`EncoderService`] and keep another to drive edges or
//! inspect what happened.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockGpio`] | [`EdgeLines`] | Simulated pins with injectable failures |
//! | [`MockRegistry`] | [`DeviceRegistry`] | Shared [`LocalRegistry`] with refusal injection and call counts |
//!
//! # Example
//!
//! ```rust
//! use rs_encoders::{CounterConfig, EncoderService, Level};
//! use rs_encoders::hal::{MockGpio, MockRegistry};
//!
//! let gpio = MockGpio::new();
//! let registry = MockRegistry::new();
//! let _service =
//!     EncoderService::start(&CounterConfig::default(), gpio.clone(), registry.clone()).unwrap();
//!
//! // B then A rising on encoder 0: two forward steps
//! gpio.set_level(27, Level::High);
//! gpio.set_level(17, Level::High);
//!
//! let mut buf = [0u8; 8];
//! assert_eq!(registry.read("encoder-driver", &mut buf), Some(Ok(8)));
//! assert_eq!(buf, [2, 0, 0, 0, 0, 0, 0, 0]);
//! ```
//!
//! [`EncoderService`]: crate::EncoderService
//! [`EdgeLines`]: crate::traits::EdgeLines
//! [`DeviceRegistry`]: crate::traits::DeviceRegistry
//! [`LocalRegistry`]: super::LocalRegistry

use std::collections::HashMap;
use std::string::String;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use super::local::{LocalHandle, LocalRegistry, LocalRegistryError};
use crate::device::{AccessError, CountDevice};
use crate::engine::EdgeHandler;
use crate::table::Level;
use crate::traits::{DeviceRegistry, EdgeLines, LineStage};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// GPIO Mock
// ============================================================================

/// Recorded GPIO operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpioEvent {
    /// Pin reserved.
    Reserve(u32),
    /// Pin configured as input.
    Configure(u32),
    /// Edge handler bound.
    Bind(u32),
    /// Pin released.
    Release(u32),
}

/// Error returned by [`MockGpio`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MockGpioError {
    /// Pin already reserved.
    #[error("pin {0} is busy")]
    Busy(u32),
    /// Failure injected with [`MockGpio::fail_at`].
    #[error("injected {stage} failure on pin {pin}")]
    Injected {
        /// Pin number.
        pin: u32,
        /// Stage that failed.
        stage: LineStage,
    },
}

#[derive(Debug, Default)]
struct GpioState {
    reserved: Vec<u32>,
    handlers: HashMap<u32, EdgeHandler>,
    levels: HashMap<u32, Level>,
    failures: Vec<(u32, LineStage)>,
    journal: Vec<GpioEvent>,
}

impl GpioState {
    fn check(&self, pin: u32, stage: LineStage) -> Result<(), MockGpioError> {
        if self.failures.contains(&(pin, stage)) {
            Err(MockGpioError::Injected { pin, stage })
        } else {
            Ok(())
        }
    }
}

/// Reserved line handle of [`MockGpio`].
#[derive(Debug, PartialEq, Eq)]
pub struct MockLine {
    pin: u32,
}

impl MockLine {
    /// Physical pin of this line.
    pub fn pin(&self) -> u32 {
        self.pin
    }
}

/// Simulated edge-capable input pins.
///
/// All pins start [`Level::Low`]. Changing a bound pin's level with
/// [`set_level`](Self::set_level) or [`toggle`](Self::toggle) fires its
/// handler once.
#[derive(Clone, Debug, Default)]
pub struct MockGpio {
    inner: Arc<Mutex<GpioState>>,
}

impl MockGpio {
    /// Creates a mock with every pin free and low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `stage` fail for `pin`.
    pub fn fail_at(self, pin: u32, stage: LineStage) -> Self {
        lock(&self.inner).failures.push((pin, stage));
        self
    }

    /// Drives `pin` to `level`. Fires the bound handler if the level changed.
    pub fn set_level(&self, pin: u32, level: Level) {
        let handler = {
            let mut state = lock(&self.inner);
            let previous = state.levels.insert(pin, level).unwrap_or_default();
            if previous == level {
                return;
            }
            state.handlers.get(&pin).cloned()
        };
        if let Some(handler) = handler {
            handler.fire(level);
        }
    }

    /// Flips the level of `pin`.
    pub fn toggle(&self, pin: u32) {
        let level = self.level(pin).toggled();
        self.set_level(pin, level);
    }

    /// Fires the bound handler with `level` whether or not the level changed.
    pub fn notify(&self, pin: u32, level: Level) {
        let handler = {
            let mut state = lock(&self.inner);
            state.levels.insert(pin, level);
            state.handlers.get(&pin).cloned()
        };
        if let Some(handler) = handler {
            handler.fire(level);
        }
    }

    /// Current simulated level of `pin`.
    pub fn level(&self, pin: u32) -> Level {
        lock(&self.inner).levels.get(&pin).copied().unwrap_or_default()
    }

    /// Handler bound to `pin`, if any.
    pub fn handler(&self, pin: u32) -> Option<EdgeHandler> {
        lock(&self.inner).handlers.get(&pin).cloned()
    }

    /// Returns true if `pin` is currently reserved.
    pub fn is_reserved(&self, pin: u32) -> bool {
        lock(&self.inner).reserved.contains(&pin)
    }

    /// Pins currently reserved.
    pub fn reserved(&self) -> Vec<u32> {
        lock(&self.inner).reserved.clone()
    }

    /// Every operation so far, in order.
    pub fn journal(&self) -> Vec<GpioEvent> {
        lock(&self.inner).journal.clone()
    }
}

impl EdgeLines for MockGpio {
    type Line = MockLine;
    type Error = MockGpioError;

    fn reserve(&mut self, pin: u32) -> Result<MockLine, MockGpioError> {
        let mut state = lock(&self.inner);
        state.check(pin, LineStage::Reserve)?;
        if state.reserved.contains(&pin) {
            return Err(MockGpioError::Busy(pin));
        }
        state.reserved.push(pin);
        state.journal.push(GpioEvent::Reserve(pin));
        Ok(MockLine { pin })
    }

    fn configure_input(&mut self, line: &mut MockLine) -> Result<(), MockGpioError> {
        let mut state = lock(&self.inner);
        state.check(line.pin, LineStage::Configure)?;
        state.journal.push(GpioEvent::Configure(line.pin));
        Ok(())
    }

    fn bind_edges(&mut self, line: &mut MockLine, handler: EdgeHandler) -> Result<(), MockGpioError> {
        let mut state = lock(&self.inner);
        state.check(line.pin, LineStage::Bind)?;
        state.handlers.insert(line.pin, handler);
        state.journal.push(GpioEvent::Bind(line.pin));
        Ok(())
    }

    fn release(&mut self, line: MockLine) {
        let mut state = lock(&self.inner);
        state.handlers.remove(&line.pin);
        state.reserved.retain(|p| *p != line.pin);
        state.journal.push(GpioEvent::Release(line.pin));
    }
}

// ============================================================================
// Registry Mock
// ============================================================================

/// Error returned by [`MockRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MockRegistryError {
    /// Name already registered.
    #[error("device '{0}' already registered")]
    Exists(String),
    /// Failure injected with [`MockRegistry::failing`].
    #[error("registration refused")]
    Refused,
}

/// Handle returned by [`MockRegistry::register`].
#[derive(Debug, PartialEq, Eq)]
pub struct MockHandle(LocalHandle);

#[derive(Debug, Default)]
struct RegistryState {
    local: LocalRegistry,
    refuse: bool,
    registrations: usize,
    unregistrations: usize,
}

/// [`LocalRegistry`] behind a shared lock, with refusal injection.
///
/// [`LocalRegistry`]: super::LocalRegistry
#[derive(Clone, Debug, Default)]
pub struct MockRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl MockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that refuses every registration.
    pub fn failing() -> Self {
        let registry = Self::default();
        lock(&registry.inner).refuse = true;
        registry
    }

    /// Device registered under `name`.
    pub fn device(&self, name: &str) -> Option<CountDevice> {
        lock(&self.inner).local.device(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.inner).local.names().map(String::from).collect();
        names.sort();
        names
    }

    /// Dispatches a read to `name`. `None` if nothing is registered there.
    pub fn read(&self, name: &str, buf: &mut [u8]) -> Option<Result<usize, AccessError>> {
        self.device(name).map(|device| device.read(buf))
    }

    /// Dispatches a write to `name`. `None` if nothing is registered there.
    pub fn write(&self, name: &str, payload: &[u8]) -> Option<usize> {
        self.device(name).map(|device| device.write(payload))
    }

    /// Successful registrations so far.
    pub fn registrations(&self) -> usize {
        lock(&self.inner).registrations
    }

    /// Unregistrations so far.
    pub fn unregistrations(&self) -> usize {
        lock(&self.inner).unregistrations
    }
}

impl DeviceRegistry for MockRegistry {
    type Handle = MockHandle;
    type Error = MockRegistryError;

    fn register(&mut self, name: &str, device: CountDevice) -> Result<MockHandle, MockRegistryError> {
        let mut state = lock(&self.inner);
        if state.refuse {
            return Err(MockRegistryError::Refused);
        }
        let handle = state
            .local
            .register(name, device)
            .map_err(|LocalRegistryError::Exists(name)| MockRegistryError::Exists(name))?;
        state.registrations += 1;
        Ok(MockHandle(handle))
    }

    fn unregister(&mut self, handle: MockHandle) {
        let mut state = lock(&self.inner);
        state.local.unregister(handle.0);
        state.unregistrations += 1;
    }
}
