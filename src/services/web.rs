//! Axum-based device registry serving count endpoints over HTTP.
//!
//! Each registered device is reachable under its name:
//! - GET `/dev/{name}` - Binary read, `4 * N` little-endian `i32`s
//! - POST/PUT `/dev/{name}` - Any body resets the counters; replies with the body length
//! - GET `/dev/{name}/status` - JSON snapshot including the edge count
//! - GET `/dev` - Registered device names

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::device::CountDevice;
use crate::traits::DeviceRegistry;

use super::api::{ApiResponse, StatusResponse};

type Devices = Arc<RwLock<BTreeMap<String, CountDevice>>>;

// ============================================================================
// Registry
// ============================================================================

/// Errors from [`WebRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebRegistryError {
    /// Name already registered.
    #[error("device '{0}' already registered")]
    Exists(String),
    /// Name cannot be used as a path segment.
    #[error("device name '{0}' is not a valid path segment")]
    InvalidName(String),
}

/// Handle returned by [`WebRegistry::register`].
#[derive(Debug, PartialEq, Eq)]
pub struct WebHandle(String);

/// Device registry shared with the HTTP router.
///
/// Clones share the same device table, so one clone can be handed to the
/// service while another builds the router.
#[derive(Clone, Default)]
pub struct WebRegistry {
    devices: Devices,
}

impl WebRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Device registered under `name`.
    pub fn device(&self, name: &str) -> Option<CountDevice> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl DeviceRegistry for WebRegistry {
    type Handle = WebHandle;
    type Error = WebRegistryError;

    fn register(&mut self, name: &str, device: CountDevice) -> Result<WebHandle, WebRegistryError> {
        if name.is_empty() || name.contains('/') {
            return Err(WebRegistryError::InvalidName(name.into()));
        }
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        if devices.contains_key(name) {
            return Err(WebRegistryError::Exists(name.into()));
        }
        devices.insert(name.into(), device);
        tracing::info!(device = name, "endpoint registered at /dev/{}", name);
        Ok(WebHandle(name.into()))
    }

    fn unregister(&mut self, handle: WebHandle) {
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0);
        tracing::info!(device = %handle.0, "endpoint unregistered");
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

fn missing(name: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err(format!("No device named '{}'", name))),
    )
        .into_response()
}

/// GET /dev - Registered device names
async fn list_devices(State(registry): State<WebRegistry>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::ok(registry.names()))
}

/// GET /dev/{name} - Binary counter read
async fn read_device(State(registry): State<WebRegistry>, Path(name): Path<String>) -> Response {
    let Some(device) = registry.device(&name) else {
        return missing(&name);
    };
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        device.read_bytes(),
    )
        .into_response()
}

/// POST/PUT /dev/{name} - Reset counters, body ignored
async fn write_device(
    State(registry): State<WebRegistry>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let Some(device) = registry.device(&name) else {
        return missing(&name);
    };
    device.write(&body).to_string().into_response()
}

/// GET /dev/{name}/status - JSON snapshot
async fn device_status(State(registry): State<WebRegistry>, Path(name): Path<String>) -> Response {
    let Some(device) = registry.device(&name) else {
        return missing(&name);
    };
    let snapshot = device.snapshot();
    Json(ApiResponse::ok(StatusResponse::new(name, snapshot))).into_response()
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_permissive: false,
        }
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}

/// Build the Axum router over a registry
pub fn build_router(registry: WebRegistry, config: &WebServerConfig) -> Router {
    let mut router = Router::new()
        .route("/dev", get(list_devices))
        .route(
            "/dev/:name",
            get(read_device).post(write_device).put(write_device),
        )
        .route("/dev/:name/status", get(device_status))
        .fallback(not_found)
        .with_state(registry);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Serve the registry until `shutdown` completes
pub async fn run_server(
    registry: WebRegistry,
    config: WebServerConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let router = build_router(registry, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "web server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CounterConfig, DecodeEngine};

    fn device() -> CountDevice {
        let engine = Arc::new(DecodeEngine::new(&CounterConfig::default()).unwrap());
        CountDevice::new(engine)
    }

    #[test]
    fn register_and_unregister() {
        let mut registry = WebRegistry::new();
        let handle = registry.register("enc", device()).unwrap();
        assert_eq!(registry.names(), vec!["enc".to_string()]);
        assert!(registry.device("enc").is_some());

        registry.unregister(handle);
        assert!(registry.names().is_empty());
    }

    #[test]
    fn rejects_bad_and_duplicate_names() {
        let mut registry = WebRegistry::new();
        assert_eq!(
            registry.register("a/b", device()),
            Err(WebRegistryError::InvalidName("a/b".into()))
        );
        assert_eq!(
            registry.register("", device()),
            Err(WebRegistryError::InvalidName(String::new()))
        );
        registry.register("enc", device()).unwrap();
        assert_eq!(
            registry.register("enc", device()),
            Err(WebRegistryError::Exists("enc".into()))
        );
    }

    #[test]
    fn clones_share_devices() {
        let registry = WebRegistry::new();
        let mut other = registry.clone();
        other.register("enc", device()).unwrap();
        assert!(registry.device("enc").is_some());
    }
}
