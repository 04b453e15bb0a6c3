//! Read/reset endpoint over a running [`DecodeEngine`].
//!
//! A read returns exactly `4 * N` bytes: N little-endian `i32` counters in
//! encoder order. A write of any payload resets every counter and reports
//! the full payload as accepted.

use alloc::sync::Arc;
use alloc::vec::Vec;

use thiserror::Error;

use crate::engine::DecodeEngine;
use crate::store::Snapshot;

/// Errors reported by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The caller's buffer cannot hold the full payload.
    #[error("copy to caller failed: need {needed} bytes, buffer holds {available}")]
    BufferTooSmall {
        /// Payload size.
        needed: usize,
        /// Caller buffer size.
        available: usize,
    },
}

/// Addressable count endpoint.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rs_encoders::{CountDevice, CounterConfig, DecodeEngine, Level};
///
/// let engine = Arc::new(DecodeEngine::new(&CounterConfig::default()).unwrap());
/// engine.start();
/// engine.on_edge(1, Level::High);
///
/// let device = CountDevice::new(engine);
/// let mut buf = [0u8; 8];
/// assert_eq!(device.read(&mut buf), Ok(8));
/// assert_eq!(buf, [1, 0, 0, 0, 0, 0, 0, 0]);
///
/// assert_eq!(device.write(b"x"), 1);
/// assert_eq!(device.snapshot().counts, vec![0, 0]);
/// ```
#[derive(Clone, Debug)]
pub struct CountDevice {
    engine: Arc<DecodeEngine>,
}

impl CountDevice {
    /// Wraps a shared engine.
    pub fn new(engine: Arc<DecodeEngine>) -> Self {
        Self { engine }
    }

    /// The engine behind this endpoint.
    #[inline]
    pub fn engine(&self) -> &Arc<DecodeEngine> {
        &self.engine
    }

    /// Size of a successful read.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.engine.encoder_count() * core::mem::size_of::<i32>()
    }

    /// Current counters and edge count.
    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        self.engine.reset();
    }

    /// Copies the encoded counters into `buf`.
    ///
    /// Returns the number of bytes written (always [`payload_len`]). A
    /// buffer that is too short is an error and nothing is copied.
    ///
    /// [`payload_len`]: Self::payload_len
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, AccessError> {
        let snapshot = self.report();
        snapshot.encode_into(buf).ok_or_else(|| {
            let err = AccessError::BufferTooSmall {
                needed: snapshot.encoded_len(),
                available: buf.len(),
            };
            tracing::warn!(error = %err, "count read failed");
            err
        })
    }

    /// Reads into an owned buffer of exactly [`payload_len`](Self::payload_len) bytes.
    pub fn read_bytes(&self) -> Vec<u8> {
        self.report().to_bytes()
    }

    /// Resets all counters; the payload is not inspected.
    ///
    /// Returns `payload.len()`.
    pub fn write(&self, payload: &[u8]) -> usize {
        self.engine.reset();
        tracing::debug!(bytes = payload.len(), "counts reset");
        payload.len()
    }

    // Snapshot plus the per-read diagnostic report.
    fn report(&self) -> Snapshot {
        let snapshot = self.engine.snapshot();
        tracing::info!(edges = snapshot.edges, "interrupt count");
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CounterConfig;
    use crate::table::Level;

    fn device() -> CountDevice {
        let engine = Arc::new(DecodeEngine::new(&CounterConfig::default()).unwrap());
        engine.start();
        CountDevice::new(engine)
    }

    #[test]
    fn read_returns_four_bytes_per_encoder() {
        let device = device();
        assert_eq!(device.payload_len(), 8);
        let mut buf = [0xFFu8; 16];
        assert_eq!(device.read(&mut buf), Ok(8));
        assert_eq!(&buf[..8], &[0; 8]);
    }

    #[test]
    fn read_into_short_buffer_fails() {
        let device = device();
        device.engine().on_edge(0, Level::High);
        let mut buf = [0u8; 4];
        assert_eq!(
            device.read(&mut buf),
            Err(AccessError::BufferTooSmall {
                needed: 8,
                available: 4
            })
        );
        assert_eq!(buf, [0; 4]);
        assert_eq!(device.snapshot().counts, alloc::vec![-1, 0]);
    }

    #[test]
    fn read_does_not_reset() {
        let device = device();
        device.engine().on_edge(3, Level::High);
        let first = device.read_bytes();
        let second = device.read_bytes();
        assert_eq!(first, second);
        assert_eq!(first, alloc::vec![0, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn write_any_payload_resets() {
        let device = device();
        device.engine().on_edge(0, Level::High);
        assert_eq!(device.write(&[]), 0);
        assert_eq!(device.snapshot().counts, alloc::vec![0, 0]);

        device.engine().on_edge(0, Level::Low);
        assert_eq!(device.write(&[1, 2, 3, 4, 5]), 5);
        let snap = device.snapshot();
        assert_eq!(snap.counts, alloc::vec![0, 0]);
        assert_eq!(snap.edges, 2);
    }
}
