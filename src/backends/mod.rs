pub mod local;
pub mod realtime;
pub mod remote;
pub mod traits;
pub mod types;

use std::sync::Arc;

use tracing::info;

pub use local::LocalBackend;
pub use remote::RemoteBackend;
pub use traits::PropertyBackend;
pub use types::{BackendKind, ChangeFeed, PropertyRow};

use crate::config::StoreConfig;
use crate::error::Result;

/// Pick the persistence backend once, from configuration.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn PropertyBackend>> {
    match &config.backend {
        Some(credentials) => {
            info!("Using hosted backend at {}", credentials.url);
            Ok(Arc::new(RemoteBackend::new(credentials)?))
        }
        None => {
            let backend = LocalBackend::in_dir(&config.data_dir, config.watch_interval);
            info!("Using local storage at {}", backend.path().display());
            Ok(Arc::new(backend))
        }
    }
}
