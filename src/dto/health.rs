use serde::Serialize;
use utoipa::ToSchema;

/// Whether the catalog store is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Store connected.
    Ok,
    /// Serving without storage while reconnecting.
    Degraded,
}

/// Body of `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall state.
    pub status: HealthStatus,
    /// Backend named by the configuration (`memory` or `mongo`).
    pub storage: String,
}

impl HealthResponse {
    /// Report `status` for the configured backend.
    pub fn new(status: HealthStatus, storage: impl Into<String>) -> Self {
        Self {
            status,
            storage: storage.into(),
        }
    }
}
