//! Device registration seam.
//!
//! A registry publishes a [`CountDevice`] under a name. Whatever transport
//! the registry uses, a read on that name must call [`CountDevice::read`]
//! (or [`CountDevice::read_bytes`]) and a write must call
//! [`CountDevice::write`].

use crate::device::CountDevice;

/// Named endpoint registration.
pub trait DeviceRegistry {
    /// Registration handle, given back to [`unregister`](Self::unregister).
    type Handle;
    /// Error type for registration.
    type Error: core::fmt::Display;

    /// Publishes `device` under `name`.
    fn register(&mut self, name: &str, device: CountDevice) -> Result<Self::Handle, Self::Error>;

    /// Removes a registration.
    fn unregister(&mut self, handle: Self::Handle);
}
