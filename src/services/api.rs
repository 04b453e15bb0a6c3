//! JSON response types for the HTTP endpoint.

use serde::{Deserialize, Serialize};

use crate::Snapshot;

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Counter status for one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Device name
    pub device: String,
    /// Edges observed since start
    pub edges: u32,
    /// Position counters in encoder order
    pub counts: Vec<i32>,
}

impl StatusResponse {
    /// Build from a device name and snapshot
    pub fn new(device: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            device: device.into(),
            edges: snapshot.edges,
            counts: snapshot.counts,
        }
    }
}
