use crate::backends::types::{BackendKind, ChangeFeed};
use crate::error::Result;
use crate::models::Property;
use async_trait::async_trait;

/// Persistence for custom (administrator-edited) property records.
///
/// One implementation is chosen at startup and injected into the store.
/// Records handed to a backend never carry a `source`; records returned
/// from it are untagged too, the store derives provenance when merging.
#[async_trait]
pub trait PropertyBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Fetch the authoritative list of custom records.
    async fn load(&self) -> Result<Vec<Property>>;

    /// Insert or fully replace the record with the same id.
    async fn upsert(&self, property: &Property) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Persist a whole list of custom records at once.
    async fn save_all(&self, properties: &[Property]) -> Result<()>;

    /// Start listening for changes made outside this process.
    fn watch(&self) -> ChangeFeed;
}
