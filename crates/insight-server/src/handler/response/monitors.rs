use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Health status of the service.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Whether the application database is reachable.
    pub is_healthy: bool,
    /// When the status was computed.
    pub updated_at: Timestamp,
}
