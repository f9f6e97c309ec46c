use crate::backends::traits::PropertyBackend;
use crate::backends::types::{BackendKind, ChangeFeed};
use crate::error::Result;
use crate::models::Property;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// File name of the custom-records document; the suffix versions the layout
pub const STORAGE_FILE: &str = "custom-properties.v1.json";

/// Custom records kept in one JSON array on local disk.
///
/// Every process pointed at the same directory shares the file. The last
/// write wins.
pub struct LocalBackend {
    path: PathBuf,
    poll_interval: Duration,
    /// Fingerprint of the content this process last wrote or the watcher last saw
    last_seen: Arc<Mutex<String>>,
    /// Serializes read-modify-write cycles and keeps the watcher off half-finished writes
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl LocalBackend {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        let path = path.into();
        let initial = fingerprint(&std::fs::read(&path).unwrap_or_default());
        Self {
            path,
            poll_interval,
            last_seen: Arc::new(Mutex::new(initial)),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn in_dir(dir: impl AsRef<Path>, poll_interval: Duration) -> Self {
        Self::new(dir.as_ref().join(STORAGE_FILE), poll_interval)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn remember(&self, digest: String) {
        let mut last_seen = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        *last_seen = digest;
    }

    /// Reading never touches `last_seen`: a change made by another process
    /// must still reach the watcher even if this process has already read it.
    async fn read_records(&self) -> Vec<Property> {
        parse_records(&read_bytes(&self.path).await)
    }

    /// Replace the stored list. Callers must hold `write_lock`.
    async fn write_locked(&self, properties: &[Property]) -> Result<()> {
        let stripped: Vec<Property> = properties.iter().map(Property::without_source).collect();
        let json = serialize_records(&stripped)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Readers in other processes must never observe a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        self.remember(fingerprint(&json));
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            "Wrote {} custom properties to {}",
            stripped.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Apply `edit` to the stored list as one step with respect to this process.
    async fn modify<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(Vec<Property>) -> Vec<Property> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let current = self.read_records().await;
        self.write_locked(&edit(current)).await
    }
}

#[async_trait]
impl PropertyBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn load(&self) -> Result<Vec<Property>> {
        Ok(self.read_records().await)
    }

    async fn upsert(&self, property: &Property) -> Result<()> {
        self.modify(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.push(property.clone());
            next.extend(current.into_iter().filter(|p| p.id != property.id));
            next
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.modify(|current| current.into_iter().filter(|p| p.id != id).collect())
            .await
    }

    async fn save_all(&self, properties: &[Property]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_locked(properties).await
    }

    fn watch(&self) -> ChangeFeed {
        let path = self.path.clone();
        let last_seen = Arc::clone(&self.last_seen);
        let write_lock = Arc::clone(&self.write_lock);
        let period = self.poll_interval;

        ChangeFeed::spawn(move |changes| async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let guard = write_lock.lock().await;
                let bytes = match tokio::fs::read(&path).await {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
                    Err(e) => {
                        debug!("Could not poll {}: {}", path.display(), e);
                        continue;
                    }
                };
                let digest = fingerprint(&bytes);

                let changed = {
                    let mut seen = last_seen.lock().unwrap_or_else(|e| e.into_inner());
                    if *seen == digest {
                        false
                    } else {
                        *seen = digest;
                        true
                    }
                };
                drop(guard);

                if changed {
                    debug!("{} changed outside this process", path.display());
                    if changes.send(()).await.is_err() {
                        break;
                    }
                }
            }
        })
    }
}

async fn read_bytes(path: &Path) -> Vec<u8> {
    match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn serialize_records(properties: &[Property]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(properties)?)
}

/// Parse the stored document. Anything unreadable counts as "no records".
pub fn parse_records(bytes: &[u8]) -> Vec<Property> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }

    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to load custom properties: {}", e);
            return Vec::new();
        }
    };

    let serde_json::Value::Array(items) = value else {
        warn!("Stored custom properties are not a JSON array, ignoring");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Property>(item) {
            Ok(property) => Some(Property {
                source: None,
                ..property
            }),
            Err(e) => {
                warn!("Skipping malformed custom property: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, PropertyMedia, Source};
    use tempfile::TempDir;

    fn listing(id: &str, name: &str) -> Property {
        Property {
            id: id.to_string(),
            name: name.to_string(),
            neighborhood: "Dubai Marina".to_string(),
            bedrooms: 2,
            bathrooms: 2,
            sqft: 1400,
            price: "AED 3,200,000".to_string(),
            labels: vec!["Sea View".to_string(), "Sea View".to_string()],
            gallery_images: vec![PropertyMedia {
                url: "data:image/jpeg;base64,AAAA".to_string(),
                title: None,
                description: Some("Living room".to_string()),
            }],
            availability: Some(Availability::Date {
                date: Some("2026-11-01".to_string()),
            }),
            visible: false,
            ..Default::default()
        }
    }

    fn backend(dir: &TempDir) -> LocalBackend {
        LocalBackend::in_dir(dir.path(), Duration::from_millis(20))
    }

    #[test]
    fn test_records_round_trip() {
        let records = vec![listing("marina-loft", "Marina Loft"), listing("jbr-flat", "JBR Flat")];
        let bytes = serialize_records(&records).unwrap();
        assert_eq!(parse_records(&bytes), records);
    }

    #[test]
    fn test_unreadable_documents_are_empty() {
        assert!(parse_records(b"").is_empty());
        assert!(parse_records(b"{not json").is_empty());
        assert!(parse_records(br#"{"id": "marina-loft"}"#).is_empty());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let bytes = br#"[{"id": "ok", "name": "Fine"}, {"name": "missing id"}, 42]"#;
        let parsed = parse_records(bytes);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "ok");
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);
        assert_eq!(backend.load().await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn test_upsert_puts_latest_first() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        backend.upsert(&listing("a", "First")).await.unwrap();
        backend.upsert(&listing("b", "Second")).await.unwrap();
        backend.upsert(&listing("a", "First, edited")).await.unwrap();

        let stored = backend.load().await.unwrap();
        let names: Vec<_> = stored.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First, edited", "Second"]);
    }

    #[tokio::test]
    async fn test_source_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        let tagged = listing("a", "Tagged").with_source(Source::Custom);
        backend.upsert(&tagged).await.unwrap();

        let raw = std::fs::read_to_string(backend.path()).unwrap();
        assert!(!raw.contains("\"source\""));
    }

    #[tokio::test]
    async fn test_delete_filters_record() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        backend.upsert(&listing("a", "Keep")).await.unwrap();
        backend.upsert(&listing("b", "Drop")).await.unwrap();
        backend.delete("b").await.unwrap();
        backend.delete("never-existed").await.unwrap();

        let stored = backend.load().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "a");
    }

    #[tokio::test]
    async fn test_watch_ignores_own_writes() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);
        let mut feed = backend.watch();

        backend.upsert(&listing("a", "Mine")).await.unwrap();

        let fired = tokio::time::timeout(Duration::from_millis(200), feed.next_change()).await;
        assert!(fired.is_err(), "own write must not fire the change feed");
    }

    #[tokio::test]
    async fn test_watch_sees_other_writers() {
        let dir = TempDir::new().unwrap();
        let ours = backend(&dir);
        let theirs = backend(&dir);
        let mut feed = ours.watch();

        theirs.upsert(&listing("a", "Theirs")).await.unwrap();

        let fired = tokio::time::timeout(Duration::from_secs(2), feed.next_change()).await;
        assert_eq!(fired.unwrap(), Some(()));
    }

    #[tokio::test]
    async fn test_reading_does_not_swallow_other_writers() {
        let dir = TempDir::new().unwrap();
        let ours = LocalBackend::in_dir(dir.path(), Duration::from_millis(200));
        let theirs = backend(&dir);
        let mut feed = ours.watch();

        theirs.upsert(&listing("a", "Theirs")).await.unwrap();
        // Read the new content before our watcher gets a chance to poll.
        assert_eq!(ours.load().await.unwrap().len(), 1);

        let fired = tokio::time::timeout(Duration::from_secs(2), feed.next_change()).await;
        assert_eq!(fired.unwrap(), Some(()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_keep_every_record() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(backend(&dir));

        let writers: Vec<_> = (0..20)
            .map(|i| {
                let backend = Arc::clone(&backend);
                tokio::spawn(async move {
                    let id = format!("listing-{}", i);
                    backend.upsert(&listing(&id, "Concurrent")).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let stored = backend.load().await.unwrap();
        assert_eq!(stored.len(), 20);
    }
}
