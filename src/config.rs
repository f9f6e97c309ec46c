use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

pub const BACKEND_URL_VAR: &str = "SUPABASE_URL";
pub const BACKEND_KEY_VAR: &str = "SUPABASE_PUBLISHABLE_KEY";
pub const DATA_DIR_VAR: &str = "LISTINGS_DATA_DIR";
pub const WATCH_INTERVAL_VAR: &str = "LISTINGS_WATCH_INTERVAL_MS";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Endpoint and access key of the hosted backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCredentials {
    pub url: String,
    pub key: String,
}

/// Store configuration, resolved once at startup
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Present only when both endpoint and key are configured
    pub backend: Option<BackendCredentials>,
    /// Directory holding the local custom-records file
    pub data_dir: PathBuf,
    /// How often local mode checks for writes from other processes
    pub watch_interval: Duration,
}

impl StoreConfig {
    /// Read configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let watch_interval = env::var(WATCH_INTERVAL_VAR)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis);

        let mut config = Self::from_vars(
            env::var(BACKEND_URL_VAR).ok(),
            env::var(BACKEND_KEY_VAR).ok(),
        );
        if let Some(dir) = env::var(DATA_DIR_VAR).ok().filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(interval) = watch_interval {
            config.watch_interval = interval;
        }
        config
    }

    /// Backend mode requires both values to be present and non-empty.
    pub fn from_vars(url: Option<String>, key: Option<String>) -> Self {
        let url = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let key = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());

        let backend = match (url, key) {
            (Some(url), Some(key)) => Some(BackendCredentials { url, key }),
            _ => None,
        };

        Self {
            backend,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            watch_interval: DEFAULT_WATCH_INTERVAL,
        }
    }

    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: None,
            data_dir: data_dir.into(),
            watch_interval: DEFAULT_WATCH_INTERVAL,
        }
    }

    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }
}
