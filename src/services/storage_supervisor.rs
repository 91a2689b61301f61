use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{catalog_store::CatalogStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the catalog store, then poll its health and reconnect with backoff.
///
/// The shared state stays degraded whenever no healthy store is available.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn CatalogStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_catalog_store(store.clone()).await;
                info!("catalog store connected; leaving degraded mode");
                delay = INITIAL_DELAY;
                watch_store(&state, store.as_ref()).await;
            }
            Err(err) => warn!(error = %err, "catalog store connection attempt failed"),
        }

        sleep(delay).await;
        delay = next_delay(delay);
    }
}

/// Poll `store` until it fails and can no longer be revived in place.
async fn watch_store(state: &SharedState, store: &dyn CatalogStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded().await {
                info!("catalog store healthy again; leaving degraded mode");
                state.update_degraded(false).await;
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        if !reconnect(state, store).await {
            warn!("exhausted catalog store reconnect attempts; staying in degraded mode");
            return;
        }
        state.update_degraded(false).await;
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(state: &SharedState, store: &dyn CatalogStore) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "catalog store reconnected after failed health check");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "catalog store reconnect failed; entering degraded mode");
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "catalog store reconnect attempt failed");
                }
                sleep(delay).await;
                delay = next_delay(delay);
            }
        }
    }
    false
}

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}
