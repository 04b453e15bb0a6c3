//! In-process device registry.
//!
//! [`LocalRegistry`] keeps endpoints in a plain list owned by the service.
//! Reads and writes are dispatched by name through
//! [`EncoderService::registry`], which is how the ESP32 firmware resets its
//! counters from the boot button.
//!
//! [`EncoderService::registry`]: crate::EncoderService::registry

use alloc::string::String;
use alloc::vec::Vec;

use crate::device::{AccessError, CountDevice};
use crate::traits::DeviceRegistry;

/// Error returned by [`LocalRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LocalRegistryError {
    /// Name already registered.
    #[error("device '{0}' already registered")]
    Exists(String),
}

/// Handle returned by [`LocalRegistry::register`].
#[derive(Debug, PartialEq, Eq)]
pub struct LocalHandle(String);

impl LocalHandle {
    /// Name the device was registered under.
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Named endpoints dispatched in-process.
#[derive(Debug, Default)]
pub struct LocalRegistry {
    devices: Vec<(String, CountDevice)>,
}

impl LocalRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Device registered under `name`.
    pub fn device(&self, name: &str) -> Option<&CountDevice> {
        self.devices
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, device)| device)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Dispatches a read to `name`. `None` if nothing is registered there.
    pub fn read(&self, name: &str, buf: &mut [u8]) -> Option<Result<usize, AccessError>> {
        self.device(name).map(|device| device.read(buf))
    }

    /// Dispatches a write to `name`. `None` if nothing is registered there.
    pub fn write(&self, name: &str, payload: &[u8]) -> Option<usize> {
        self.device(name).map(|device| device.write(payload))
    }
}

impl DeviceRegistry for LocalRegistry {
    type Handle = LocalHandle;
    type Error = LocalRegistryError;

    fn register(&mut self, name: &str, device: CountDevice) -> Result<LocalHandle, LocalRegistryError> {
        if self.device(name).is_some() {
            return Err(LocalRegistryError::Exists(name.into()));
        }
        self.devices.push((name.into(), device));
        Ok(LocalHandle(name.into()))
    }

    fn unregister(&mut self, handle: LocalHandle) {
        self.devices.retain(|(name, _)| *name != handle.0);
    }
}
