//! Hypernucleus server entrypoint wiring the REST routes to the catalog store.

use std::{env, net::SocketAddr};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hypernucleus_server::{
    build_router,
    config::{AppConfig, StorageBackend},
    dao::catalog_store::MemoryCatalogStore,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = init_state(config);

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the catalog store named by the configuration.
fn init_state(config: AppConfig) -> SharedState {
    match config.storage {
        StorageBackend::Memory => {
            info!("using in-memory catalog store");
            AppState::with_store(config, std::sync::Arc::new(MemoryCatalogStore::new()))
        }
        StorageBackend::Mongo => mongo_state(config),
    }
}

#[cfg(feature = "mongo-store")]
fn mongo_state(config: AppConfig) -> SharedState {
    use std::sync::Arc;

    use hypernucleus_server::{
        dao::catalog_store::{
            CatalogStore,
            mongodb::{MongoCatalogStore, MongoConfig},
        },
        dao::storage::StorageError,
        services::storage_supervisor,
    };

    let mongo_uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let mongo_db = env::var("MONGO_DB").ok();
    info!(uri = %mongo_uri, "using MongoDB catalog store; starting in degraded mode");

    let state = AppState::new(config);
    let connect = move || {
        let uri = mongo_uri.clone();
        let db_name = mongo_db.clone();
        async move {
            let mongo_config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
            let store = MongoCatalogStore::connect(mongo_config).await?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn CatalogStore>)
        }
    };
    tokio::spawn(storage_supervisor::run(state.clone(), connect));
    state
}

#[cfg(not(feature = "mongo-store"))]
fn mongo_state(config: AppConfig) -> SharedState {
    tracing::warn!("built without the mongo-store feature; serving in degraded mode");
    AppState::new(config)
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
