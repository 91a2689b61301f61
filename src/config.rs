//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "HYPERNUCLEUS_CONFIG_PATH";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Which [`CatalogStore`](crate::dao::catalog_store::CatalogStore) backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// In-process maps; contents are lost on restart.
    Memory,
    /// MongoDB, configured through `MONGO_URI` and `MONGO_DB`.
    Mongo,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Base URL prepended to download links in catalog exports.
    pub public_url: String,
    /// Store selected at startup.
    pub storage: StorageBackend,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        storage = ?app_config.storage,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Public download URL of an uploaded file.
    pub fn file_url(&self, file_id: uuid::Uuid) -> String {
        format!(
            "{}/outputs/file/{}",
            self.public_url.trim_end_matches('/'),
            file_id
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_url: DEFAULT_PUBLIC_URL.to_owned(),
            storage: default_storage(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    public_url: Option<String>,
    #[serde(default)]
    storage: Option<StorageBackend>,
    #[serde(default)]
    max_upload_bytes: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            public_url: value.public_url.unwrap_or(defaults.public_url),
            storage: value.storage.unwrap_or(defaults.storage),
            max_upload_bytes: value.max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
        }
    }
}

/// Mongo when the build ships it, memory otherwise.
fn default_storage() -> StorageBackend {
    if cfg!(feature = "mongo-store") {
        StorageBackend::Mongo
    } else {
        StorageBackend::Memory
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
