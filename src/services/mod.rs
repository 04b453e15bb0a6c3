//! Network endpoint for the encoder counters.
//!
//! The `web` feature provides [`WebRegistry`], a [`DeviceRegistry`]
//! implementation whose devices are served by an Axum router. Hand one clone
//! of the registry to [`EncoderService::start`] and build the router from
//! another:
//!
//! ```ignore
//! use rs_encoders::services::{build_router, WebRegistry, WebServerConfig};
//!
//! let registry = WebRegistry::new();
//! let service = EncoderService::start(&config, gpio, registry.clone())?;
//! let router = build_router(registry, &WebServerConfig::default());
//! ```
//!
//! [`DeviceRegistry`]: crate::traits::DeviceRegistry
//! [`EncoderService::start`]: crate::EncoderService::start

pub mod api;
pub mod web;

pub use api::*;
pub use web::*;
