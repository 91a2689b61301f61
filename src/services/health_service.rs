use tracing::warn;

use crate::{
    config::StorageBackend,
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

/// Probe the catalog store and report whether the server runs degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_catalog_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "catalog store health check failed");
            }
        }
        Err(_) => warn!("catalog store unavailable (degraded mode)"),
    }

    let status = if state.is_degraded().await {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    };
    let storage = match state.config().storage {
        StorageBackend::Memory => "memory",
        StorageBackend::Mongo => "mongo",
    };
    HealthResponse::new(status, storage)
}
