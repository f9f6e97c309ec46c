//! The property store: one live view over built-in and custom listings.
//!
//! Custom records come from the injected [`PropertyBackend`]; built-in records
//! are fixed for the lifetime of the store. Every mutation ends with a resync
//! against the backend, whether or not the write itself succeeded, so the
//! cached view always converges on what the backend actually holds.

use crate::backends::{BackendKind, PropertyBackend};
use crate::catalog::builtin_properties;
use crate::error::Result;
use crate::models::{Property, Source};
use crate::query::{ListingStats, PropertyQuery};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Custom records first, then every built-in record no custom record shadows.
///
/// Shadowing replaces the whole record; fields are never merged.
pub fn merge_properties(custom: &[Property], builtin: &[Property]) -> Vec<Property> {
    let custom_ids: HashSet<&str> = custom.iter().map(|p| p.id.as_str()).collect();

    let customs = custom.iter().cloned().map(|p| p.with_source(Source::Custom));
    let initials = builtin
        .iter()
        .filter(|p| !custom_ids.contains(p.id.as_str()))
        .cloned()
        .map(|p| p.with_source(Source::Initial));

    customs.chain(initials).collect()
}

pub struct PropertyStore {
    backend: Arc<dyn PropertyBackend>,
    builtin: Vec<Property>,
    /// Last custom records fetched from the backend
    cache: RwLock<Vec<Property>>,
    /// One load-and-replace at a time, so an older read never lands last
    refreshing: Mutex<()>,
    updates: broadcast::Sender<()>,
}

impl PropertyStore {
    /// Store over `backend` with the built-in catalog.
    pub async fn open(backend: Arc<dyn PropertyBackend>) -> Arc<Self> {
        Self::with_catalog(backend, builtin_properties()).await
    }

    pub async fn with_catalog(backend: Arc<dyn PropertyBackend>, builtin: Vec<Property>) -> Arc<Self> {
        let (updates, _) = broadcast::channel(64);
        let store = Arc::new(Self {
            backend,
            builtin,
            cache: RwLock::new(Vec::new()),
            refreshing: Mutex::new(()),
            updates,
        });

        // Local mode serves reads from a cache filled here. Backend mode stays
        // empty until the first fetch, which subscribing starts.
        if store.kind() == BackendKind::Local {
            store.refresh().await;
        }
        info!("Property store ready in {} mode", store.kind());
        store
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    fn cached(&self) -> Vec<Property> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn notify(&self) {
        // No receivers is fine: nobody is subscribed yet.
        let _ = self.updates.send(());
    }

    /// Best-known merged listing. Never waits on disk or network.
    ///
    /// The cache is replaced after every write through this store and after
    /// every change reported by the backend's feed.
    pub fn get_snapshot(&self) -> Vec<Property> {
        merge_properties(&self.cached(), &self.builtin)
    }

    pub fn find_by_id(&self, id: &str) -> Option<Property> {
        self.get_snapshot().into_iter().find(|p| p.id == id)
    }

    /// Listings shown to the public: hidden records filtered out.
    pub fn visible_listings(&self) -> Vec<Property> {
        self.get_snapshot()
            .into_iter()
            .filter(Property::is_visible)
            .collect()
    }

    pub fn query(&self, query: &PropertyQuery) -> Vec<Property> {
        query.apply(self.get_snapshot())
    }

    pub fn stats(&self) -> ListingStats {
        ListingStats::from_properties(&self.get_snapshot())
    }

    /// Re-read the authoritative custom records.
    ///
    /// Failures are logged and the last known records stay in place.
    pub async fn refresh(&self) {
        let _refreshing = self.refreshing.lock().await;
        match self.backend.load().await {
            Ok(custom) => {
                debug!("Loaded {} custom properties", custom.len());
                *self.cache.write().unwrap_or_else(|e| e.into_inner()) = custom;
                self.notify();
            }
            Err(e) => {
                warn!("Failed to load custom properties, keeping last known state: {}", e);
            }
        }
    }

    /// Insert or replace the custom record with `property.id`.
    ///
    /// The caller is trusted to have validated the record. A backend failure
    /// is returned, but only after the resync has run.
    pub async fn upsert(&self, property: Property) -> Result<()> {
        let record = property.without_source();
        let outcome = self.backend.upsert(&record).await;
        if let Err(e) = &outcome {
            error!("Failed to upsert property {}: {}", record.id, e);
        }
        self.refresh().await;
        outcome
    }

    /// Delete the custom record with `id`.
    ///
    /// A built-in record of the same id becomes visible again.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let outcome = self.backend.delete(id).await;
        if let Err(e) = &outcome {
            error!("Failed to delete property {}: {}", id, e);
        }
        self.refresh().await;
        outcome
    }

    /// Persist every `custom`-tagged record of a merged list.
    pub async fn persist_merged(&self, properties: &[Property]) -> Result<()> {
        let custom: Vec<Property> = properties
            .iter()
            .filter(|p| p.is_custom())
            .map(Property::without_source)
            .collect();

        let outcome = self.backend.save_all(&custom).await;
        if let Err(e) = &outcome {
            error!("Failed to persist {} custom properties: {}", custom.len(), e);
        }
        self.refresh().await;
        outcome
    }

    /// Flip visibility of a listing. A built-in listing becomes a custom override.
    pub async fn toggle_visibility(&self, id: &str) -> Result<Option<Property>> {
        let Some(current) = self.find_by_id(id) else {
            return Ok(None);
        };

        let mut updated = current.without_source();
        updated.visible = !current.visible;
        updated.touch(Some(&current), Utc::now());

        self.upsert(updated.clone()).await?;
        Ok(Some(updated.with_source(Source::Custom)))
    }

    /// Copy the built-in catalog into the backend as custom records.
    ///
    /// Records are upserted one at a time, so custom records with other ids
    /// survive. A record already stored under a catalog id is replaced.
    pub async fn seed_catalog(&self) -> Result<usize> {
        let now = Utc::now();
        let records: Vec<Property> = self
            .builtin
            .iter()
            .map(|p| {
                let mut record = p.without_source();
                record.touch(None, now);
                record
            })
            .collect();

        let mut outcome = Ok(records.len());
        // Upserting moves a local record to the front, so go last to first.
        for record in records.iter().rev() {
            if let Err(e) = self.backend.upsert(record).await {
                error!("Failed to seed property {}: {}", record.id, e);
                outcome = Err(e);
                break;
            }
        }
        self.refresh().await;
        outcome
    }

    /// Call `callback` whenever the merged view may have changed.
    ///
    /// Changes made through this store fire immediately; changes made by other
    /// processes or clients arrive through the backend's change feed and are
    /// resynced first. In backend mode an initial fetch starts right away.
    /// The callback takes no arguments: re-read with [`get_snapshot`](Self::get_snapshot).
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut updates = self.updates.subscribe();
        let mut feed = self.backend.watch();
        let store = Arc::clone(self);

        let task = tokio::spawn(async move {
            if store.kind() == BackendKind::Remote {
                store.refresh().await;
            }

            let mut feed_open = true;
            loop {
                tokio::select! {
                    received = updates.recv() => match received {
                        Ok(()) | Err(RecvError::Lagged(_)) => callback(),
                        Err(RecvError::Closed) => break,
                    },
                    change = feed.next_change(), if feed_open => match change {
                        Some(()) => store.refresh().await,
                        None => feed_open = false,
                    },
                }
            }
        });

        Subscription { task: Some(task) }
    }
}

/// Handle to a registered callback. Dropping it unsubscribes.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{ChangeFeed, LocalBackend};
    use crate::error::StoreError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    fn listing(id: &str, name: &str) -> Property {
        Property {
            id: id.to_string(),
            name: name.to_string(),
            neighborhood: "Dubai Marina".to_string(),
            bedrooms: 3,
            bathrooms: 2,
            sqft: 1800,
            price: "AED 4,000,000".to_string(),
            ..Default::default()
        }
    }

    /// Backend that holds rows in memory and can be told to reject writes
    #[derive(Default)]
    struct FlakyBackend {
        rows: Mutex<Vec<Property>>,
        reject_writes: Mutex<bool>,
        loads: Mutex<usize>,
    }

    #[async_trait]
    impl PropertyBackend for FlakyBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Remote
        }

        async fn load(&self) -> Result<Vec<Property>> {
            *self.loads.lock().unwrap() += 1;
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn upsert(&self, property: &Property) -> Result<()> {
            if *self.reject_writes.lock().unwrap() {
                return Err(StoreError::Backend {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            let mut rows = self.rows.lock().unwrap();
            rows.retain(|p| p.id != property.id);
            rows.push(property.clone());
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.rows.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn save_all(&self, properties: &[Property]) -> Result<()> {
            for property in properties {
                self.upsert(property).await?;
            }
            Ok(())
        }

        fn watch(&self) -> ChangeFeed {
            ChangeFeed::disabled()
        }
    }

    async fn local_store(dir: &TempDir) -> Arc<PropertyStore> {
        let backend = LocalBackend::in_dir(dir.path(), Duration::from_millis(20));
        PropertyStore::open(Arc::new(backend)).await
    }

    #[test]
    fn test_merge_shadows_builtin() {
        let builtin = vec![listing("a", "Built-in A"), listing("b", "Built-in B")];
        let mut custom_b = listing("b", "Custom B");
        custom_b.bedrooms = 9;
        let custom = vec![custom_b.clone(), listing("c", "Custom C")];

        let merged = merge_properties(&custom, &builtin);
        let ids: Vec<_> = merged.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        assert_eq!(merged[0], custom_b.with_source(Source::Custom));
        assert_eq!(merged[2].source, Some(Source::Initial));
    }

    #[tokio::test]
    async fn test_local_upsert_is_read_after_write() {
        let dir = TempDir::new().unwrap();
        let store = local_store(&dir).await;

        let property = listing("marina-loft", "Marina Loft");
        store.upsert(property.clone()).await.unwrap();

        let found = store.find_by_id("marina-loft").unwrap();
        assert_eq!(found, property.with_source(Source::Custom));
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = local_store(&dir).await;
        assert!(store.find_by_id("does-not-exist").is_none());
    }

    #[tokio::test]
    async fn test_toggle_builtin_creates_override() {
        let dir = TempDir::new().unwrap();
        let store = local_store(&dir).await;

        let toggled = store
            .toggle_visibility("palm-residence")
            .await
            .unwrap()
            .unwrap();
        assert!(!toggled.visible);
        assert!(toggled.updated_at.is_some());
        assert!(toggled.created_at.is_some(), "a new override is stamped as created");

        let snapshot = store.get_snapshot();
        let matches: Vec<_> = snapshot.iter().filter(|p| p.id == "palm-residence").collect();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].is_custom());
        assert!(!store.visible_listings().iter().any(|p| p.id == "palm-residence"));

        assert!(store.toggle_visibility("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persist_merged_keeps_only_custom() {
        let dir = TempDir::new().unwrap();
        let store = local_store(&dir).await;

        let mut merged = store.get_snapshot();
        merged.push(listing("new-one", "New").with_source(Source::Custom));
        store.persist_merged(&merged).await.unwrap();

        let stats = store.stats();
        assert_eq!(stats.custom, 1);
        assert_eq!(stats.total, builtin_properties().len() + 1);
    }

    #[tokio::test]
    async fn test_seed_turns_catalog_into_custom_records() {
        let dir = TempDir::new().unwrap();
        let store = local_store(&dir).await;

        let seeded = store.seed_catalog().await.unwrap();
        assert_eq!(seeded, builtin_properties().len());

        let snapshot = store.get_snapshot();
        assert_eq!(snapshot.len(), seeded);
        assert!(snapshot.iter().all(|p| p.is_custom() && p.created_at.is_some()));
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_custom_records() {
        let dir = TempDir::new().unwrap();
        let store = local_store(&dir).await;
        store.upsert(listing("my-listing", "Mine")).await.unwrap();

        let seeded = store.seed_catalog().await.unwrap();

        let mine = store.find_by_id("my-listing").expect("custom record survives seeding");
        assert_eq!(mine.name, "Mine");
        let stats = store.stats();
        assert_eq!(stats.custom, seeded + 1);
        assert_eq!(stats.total, seeded + 1);

        let catalog_ids: Vec<_> = builtin_properties().into_iter().map(|p| p.id).collect();
        let seeded_ids: Vec<_> = store
            .get_snapshot()
            .into_iter()
            .take(seeded)
            .map(|p| p.id)
            .collect();
        assert_eq!(seeded_ids, catalog_ids, "catalog order is kept");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_local_upserts_are_all_visible() {
        let dir = TempDir::new().unwrap();
        let store = local_store(&dir).await;

        let writers: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let id = format!("listing-{}", i);
                    store.upsert(listing(&id, "Concurrent")).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        assert_eq!(store.stats().custom, 20);
        for i in 0..20 {
            assert!(store.find_by_id(&format!("listing-{}", i)).is_some());
        }
    }

    #[tokio::test]
    async fn test_failed_upsert_still_resyncs() {
        let backend = Arc::new(FlakyBackend::default());
        backend.rows.lock().unwrap().push(listing("kept", "Kept"));
        *backend.reject_writes.lock().unwrap() = true;

        let store = PropertyStore::with_catalog(backend.clone(), Vec::new()).await;
        assert!(store.get_snapshot().is_empty(), "backend mode starts empty");

        let result = store.upsert(listing("lost", "Lost")).await;
        assert!(matches!(result, Err(StoreError::Backend { status: 503, .. })));
        assert_eq!(*backend.loads.lock().unwrap(), 1);

        let ids: Vec<_> = store.get_snapshot().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["kept".to_string()]);
    }

    #[tokio::test]
    async fn test_remote_subscribe_fetches_immediately() {
        let backend = Arc::new(FlakyBackend::default());
        backend.rows.lock().unwrap().push(listing("remote", "Remote"));
        let store = PropertyStore::with_catalog(backend, Vec::new()).await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _subscription = store.subscribe(move || {
            let _ = tx.send(());
        });

        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("callback fired")
            .unwrap();
        assert!(store.find_by_id("remote").is_some());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_callbacks() {
        let dir = TempDir::new().unwrap();
        let store = local_store(&dir).await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = store.subscribe(move || {
            let _ = tx.send(());
        });
        subscription.unsubscribe();

        store.upsert(listing("a", "A")).await.unwrap();
        // The callback (and its sender) is dropped with the task.
        let next = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(next.unwrap(), None);
    }

    /// Remote-mode backend whose change feed reports when it is torn down
    struct FeedBackend {
        feed_dropped: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    }

    #[async_trait]
    impl PropertyBackend for FeedBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Remote
        }

        async fn load(&self) -> Result<Vec<Property>> {
            Ok(Vec::new())
        }

        async fn upsert(&self, _property: &Property) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn save_all(&self, _properties: &[Property]) -> Result<()> {
            Ok(())
        }

        fn watch(&self) -> ChangeFeed {
            let dropped = self.feed_dropped.lock().unwrap().take();
            ChangeFeed::spawn(move |changes| async move {
                // Both are released only when the listener task goes away.
                let _dropped = dropped;
                let _changes = changes;
                std::future::pending::<()>().await;
            })
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_tears_down_remote_feed() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let backend = Arc::new(FeedBackend {
            feed_dropped: Mutex::new(Some(tx)),
        });
        let store = PropertyStore::with_catalog(backend, Vec::new()).await;

        let subscription = store.subscribe(|| {});
        tokio::time::sleep(Duration::from_millis(50)).await;
        subscription.unsubscribe();

        let torn_down = tokio::time::timeout(Duration::from_secs(2), rx).await;
        assert!(
            matches!(torn_down, Ok(Err(_))),
            "listener task should be aborted and its sender dropped"
        );
    }
}
