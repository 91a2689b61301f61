use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::catalog_store::CatalogStore, error::ServiceError};

/// State handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// Central application state holding the configuration and the storage handle.
pub struct AppState {
    config: AppConfig,
    catalog_store: RwLock<Option<Arc<dyn CatalogStore>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            catalog_store: RwLock::new(None),
            degraded: degraded_tx,
        })
    }

    /// Build a state with `store` already installed.
    pub fn with_store(config: AppConfig, store: Arc<dyn CatalogStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            config,
            catalog_store: RwLock::new(Some(store)),
            degraded: degraded_tx,
        })
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current catalog store, if one is installed.
    pub async fn catalog_store(&self) -> Option<Arc<dyn CatalogStore>> {
        let guard = self.catalog_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current catalog store, or [`ServiceError::Degraded`] when none is usable.
    pub async fn require_catalog_store(&self) -> Result<Arc<dyn CatalogStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.catalog_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new catalog store implementation and leave degraded mode.
    pub async fn set_catalog_store(&self, store: Arc<dyn CatalogStore>) {
        {
            let mut guard = self.catalog_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let degraded = *self.degraded.borrow();
        degraded
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
