//! Service lifecycle: registration, running state and teardown.
//!
//! [`EncoderService`] owns the GPIO backend and the device registry for as
//! long as the counters are live. Startup is all-or-nothing:
//!
//! 1. the configuration is validated and the engine built (stopped),
//! 2. the endpoint is registered,
//! 3. every line is reserved, configured and bound in line order,
//! 4. the engine enters the running state.
//!
//! Any failure releases what was acquired, in reverse order, and reports
//! which resource failed. Teardown happens on [`EncoderService::stop`] or
//! when the service is dropped.
//!
//! # Example
//!
//! ```rust
//! use rs_encoders::{CounterConfig, EncoderService, Level};
//! use rs_encoders::hal::{MockGpio, MockRegistry};
//!
//! let gpio = MockGpio::new();
//! let registry = MockRegistry::new();
//! let service = EncoderService::start(
//!     &CounterConfig::default(),
//!     gpio.clone(),
//!     registry.clone(),
//! ).unwrap();
//!
//! gpio.set_level(27, Level::High); // encoder 0, channel B
//! assert_eq!(service.snapshot().counts, vec![1, 0]);
//!
//! service.stop();
//! assert!(registry.device("encoder-driver").is_none());
//! ```

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use thiserror::Error;

use crate::config::{ConfigError, CounterConfig, ShortString};
use crate::device::CountDevice;
use crate::engine::{DecodeEngine, EdgeHandler};
use crate::store::Snapshot;
use crate::table::Channel;
use crate::traits::{DeviceRegistry, EdgeLines, LineStage};

/// Why the service failed to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The endpoint could not be registered.
    #[error("failed to register device '{name}': {reason}")]
    Register {
        /// Endpoint name.
        name: ShortString,
        /// Registry error text.
        reason: String,
    },
    /// A line could not be acquired.
    #[error("failed to {stage} for encoder {encoder} channel {channel} (pin {pin}): {reason}")]
    Line {
        /// Failing stage.
        stage: LineStage,
        /// Encoder index.
        encoder: usize,
        /// Channel of the encoder.
        channel: Channel,
        /// Physical pin.
        pin: u32,
        /// Backend error text.
        reason: String,
    },
}

/// Running encoder counter service.
pub struct EncoderService<G: EdgeLines, R: DeviceRegistry> {
    engine: Arc<DecodeEngine>,
    device: CountDevice,
    gpio: G,
    registry: R,
    lines: Vec<G::Line>,
    handle: Option<R::Handle>,
}

impl<G: EdgeLines, R: DeviceRegistry> EncoderService<G, R> {
    /// Registers the endpoint and every line, then starts decoding.
    pub fn start(config: &CounterConfig, gpio: G, registry: R) -> Result<Self, StartupError> {
        let engine = Arc::new(DecodeEngine::new(config).inspect_err(|e| {
            tracing::error!(error = %e, "rejected encoder configuration");
        })?);
        let device = CountDevice::new(Arc::clone(&engine));

        let mut service = Self {
            engine,
            device,
            gpio,
            registry,
            lines: Vec::with_capacity(config.line_count()),
            handle: None,
        };

        if let Err(e) = service.acquire(config) {
            tracing::error!(error = %e, "encoder startup failed");
            service.release();
            return Err(e);
        }

        service.engine.start();
        tracing::info!(
            device = config.device_name.as_str(),
            mode = config.mode.as_str(),
            encoders = config.encoder_count(),
            "encoder service running"
        );
        Ok(service)
    }

    fn acquire(&mut self, config: &CounterConfig) -> Result<(), StartupError> {
        let name = config.device_name.as_str();
        let handle = self
            .registry
            .register(name, self.device.clone())
            .map_err(|e| StartupError::Register {
                name: config.device_name.clone(),
                reason: e.to_string(),
            })?;
        self.handle = Some(handle);

        for (line, info) in self.engine.lines().iter() {
            let handler = EdgeHandler::new(Arc::clone(&self.engine), line);
            let bound = self
                .gpio
                .acquire(info.pin, handler)
                .map_err(|(stage, e)| StartupError::Line {
                    stage,
                    encoder: info.encoder,
                    channel: info.channel,
                    pin: info.pin,
                    reason: e.to_string(),
                })?;
            tracing::debug!(line, pin = info.pin, encoder = info.encoder, "line bound");
            self.lines.push(bound);
        }
        Ok(())
    }

    // Lines first so no edge reaches the engine once the endpoint is gone.
    fn release(&mut self) {
        self.engine.stop();
        while let Some(line) = self.lines.pop() {
            self.gpio.release(line);
        }
        if let Some(handle) = self.handle.take() {
            self.registry.unregister(handle);
        }
    }

    /// Stops decoding, releases every line and unregisters the endpoint.
    ///
    /// Dropping the service does the same.
    pub fn stop(mut self) {
        tracing::info!("encoder service stopping");
        self.release();
    }

    /// Returns true while lines are bound or the endpoint is registered.
    fn holds_resources(&self) -> bool {
        self.handle.is_some() || !self.lines.is_empty()
    }

    /// The shared decode engine.
    #[inline]
    pub fn engine(&self) -> &Arc<DecodeEngine> {
        &self.engine
    }

    /// The registered endpoint.
    #[inline]
    pub fn device(&self) -> &CountDevice {
        &self.device
    }

    /// Current counters and edge count.
    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        self.engine.reset();
    }

    /// Mutable access to the GPIO backend, e.g. to drive a polling loop.
    #[inline]
    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    /// The device registry.
    #[inline]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Number of bound lines.
    #[inline]
    pub fn bound_lines(&self) -> usize {
        self.lines.len()
    }
}

impl<G: EdgeLines, R: DeviceRegistry> Drop for EncoderService<G, R> {
    fn drop(&mut self) {
        if self.holds_resources() {
            tracing::info!("encoder service dropped while running, releasing");
            self.release();
        }
    }
}
