//! JSON file key-value backend
//!
//! The whole store is one JSON object of string values. Writes go to a
//! sibling temporary file which is then renamed over the original, so a
//! reader in another process sees either the old or the new contents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::types::CHANGE_CHANNEL_CAPACITY;
use super::{
    ContextId, KeyValueStore, StorageChange, StorageError, StorageResult, StorageSubscription,
};

type Entries = BTreeMap<String, String>;

struct Shared {
    path: PathBuf,
    /// Serialises read-modify-write cycles and external sync within this process
    write_lock: Mutex<()>,
    /// Contents as of the last write or sync performed by this process
    last_seen: parking_lot::Mutex<Entries>,
    changes: broadcast::Sender<StorageChange>,
}

/// File-backed store shared by every context of this process
///
/// Writes from other processes are only noticed by [`FileStorage::sync_external`],
/// which [`FileStorage::watch`] runs on filesystem events and on a timer.
#[derive(Clone)]
pub struct FileStorage {
    shared: Arc<Shared>,
    context: ContextId,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if path.file_name().is_none() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a file path",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let initial = match std::fs::read_to_string(&path) {
            Ok(contents) => parse_entries(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => return Err(e.into()),
        };

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        debug!(path = %path.display(), keys = initial.len(), "opened file storage");

        Ok(Self {
            shared: Arc::new(Shared {
                path,
                write_lock: Mutex::new(()),
                last_seen: parking_lot::Mutex::new(initial),
                changes,
            }),
            context: ContextId::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// New handle on the same file with its own context identity
    pub fn context(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), context: ContextId::new() }
    }

    /// Compare the file with what this process last saw and publish the
    /// differences as external changes
    ///
    /// Returns the changes found, in key order.
    pub async fn sync_external(&self) -> StorageResult<Vec<StorageChange>> {
        let _guard = self.shared.write_lock.lock().await;
        let current = self.load().await?;
        Ok(self.absorb(current))
    }

    /// Start watching the file for writes made by other processes
    ///
    /// Uses `notify` on the parent directory with a polling fallback at
    /// `poll_interval`. Watching stops when the returned handle is dropped.
    pub fn watch(&self, poll_interval: Duration) -> WatchHandle {
        let storage = self.clone();
        let task = tokio::spawn(async move {
            let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
            let watcher = storage.setup_notify_watcher(wake_tx);
            if watcher.is_none() {
                debug!(path = %storage.path().display(), "file notifications unavailable, polling only");
            }

            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    Some(()) = wake_rx.recv() => {}
                    _ = ticker.tick() => {}
                }

                match storage.sync_external().await {
                    Ok(changes) if !changes.is_empty() => {
                        debug!(count = changes.len(), "picked up external storage changes");
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "failed to sync storage file"),
                }
            }
        });

        WatchHandle { task }
    }

    fn setup_notify_watcher(&self, wake_tx: mpsc::Sender<()>) -> Option<notify::RecommendedWatcher> {
        use notify::{RecursiveMode, Watcher};

        let mut watcher = notify::recommended_watcher(move |_: notify::Result<notify::Event>| {
            let _ = wake_tx.try_send(());
        })
        .ok()?;

        // Watch the directory; the file itself is replaced on every write
        let watch_path = self
            .shared
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher.watch(watch_path, RecursiveMode::NonRecursive).ok()?;

        Some(watcher)
    }

    async fn load(&self) -> StorageResult<Entries> {
        match tokio::fs::read_to_string(&self.shared.path).await {
            Ok(contents) => parse_entries(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, entries: &Entries) -> StorageResult<()> {
        let path = &self.shared.path;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::Unavailable(format!("{} has no file name", path.display())))?;
        let temp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

        let json = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&temp, json).await?;
        if let Err(err) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(err.into());
        }
        Ok(())
    }

    /// Record `current` as seen and publish whatever differs from before
    fn absorb(&self, current: Entries) -> Vec<StorageChange> {
        let mut last_seen = self.shared.last_seen.lock();
        let changes = diff(&last_seen, &current);
        *last_seen = current;
        drop(last_seen);

        for change in &changes {
            let _ = self.shared.changes.send(change.clone());
        }
        changes
    }

    async fn mutate(&self, key: &str, value: Option<&str>) -> StorageResult<()> {
        let _guard = self.shared.write_lock.lock().await;

        let mut entries = self.load().await?;
        // Anything another process wrote since we last looked is announced first
        self.absorb(entries.clone());

        let changed = match value {
            Some(value) => entries.insert(key.to_string(), value.to_string()).as_deref() != Some(value),
            None => entries.remove(key).is_some(),
        };
        if !changed {
            return Ok(());
        }

        self.persist(&entries).await?;
        *self.shared.last_seen.lock() = entries;
        let _ = self
            .shared
            .changes
            .send(StorageChange::new(key, value.map(str::to_string), self.context));
        Ok(())
    }
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("path", &self.shared.path)
            .field("context", &self.context)
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for FileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.mutate(key, Some(value)).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.mutate(key, None).await
    }

    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.shared.changes.subscribe(), self.context)
    }

    fn context_id(&self) -> ContextId {
        self.context
    }
}

/// Background watcher started by [`FileStorage::watch`]; aborts on drop
#[derive(Debug)]
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn stop(self) {}
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn parse_entries(contents: &str) -> StorageResult<Entries> {
    if contents.trim().is_empty() {
        return Ok(Entries::new());
    }
    Ok(serde_json::from_str(contents)?)
}

fn diff(before: &Entries, after: &Entries) -> Vec<StorageChange> {
    let origin = ContextId::external();
    let mut changes: Vec<StorageChange> = after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, value)| StorageChange::new(key.clone(), Some(value.clone()), origin))
        .collect();
    changes.extend(
        before
            .keys()
            .filter(|key| !after.contains_key(*key))
            .map(|key| StorageChange::new(key.clone(), None, origin)),
    );
    changes.sort_by(|a, b| a.key.cmp(&b.key));
    changes
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store_in(dir: &TempDir) -> FileStorage {
        FileStorage::open(dir.path().join("session.json")).unwrap()
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let storage = store_in(&dir);

        storage.set("accessToken", "tok-1").await.unwrap();
        storage.set("user", r#"{"email":"a@b.co"}"#).await.unwrap();
        drop(storage);

        let reopened = store_in(&dir);
        assert_eq!(reopened.get("accessToken").await.unwrap().as_deref(), Some("tok-1"));
        assert_eq!(
            reopened.get("user").await.unwrap().as_deref(),
            Some(r#"{"email":"a@b.co"}"#)
        );
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let storage = store_in(&dir);

        storage.set("accessToken", "tok-1").await.unwrap();
        storage.remove("accessToken").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["session.json".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStorage::open(&path), Err(StorageError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_sync_external_reports_other_process_writes() {
        let dir = TempDir::new().unwrap();
        let ours = store_in(&dir);
        let theirs = store_in(&dir);

        ours.set("accessToken", "tok-1").await.unwrap();
        assert!(ours.sync_external().await.unwrap().is_empty());

        theirs.set("accessToken", "tok-2").await.unwrap();
        theirs.set("user", "{}").await.unwrap();

        let changes = ours.sync_external().await.unwrap();
        assert_eq!(
            changes,
            vec![
                StorageChange::new("accessToken", Some("tok-2".to_string()), ContextId::external()),
                StorageChange::new("user", Some("{}".to_string()), ContextId::external()),
            ]
        );

        theirs.remove("accessToken").await.unwrap();
        let changes = ours.sync_external().await.unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].is_removal());
    }

    #[tokio::test]
    async fn test_unchanged_value_is_not_announced() {
        let dir = TempDir::new().unwrap();
        let tab_a = store_in(&dir);
        let tab_b = tab_a.context();
        let mut b_changes = tab_b.subscribe();

        tab_a.set("accessToken", "tok-1").await.unwrap();
        tab_a.set("accessToken", "tok-1").await.unwrap();
        tab_a.set("user", "{}").await.unwrap();

        assert_eq!(b_changes.recv().await.unwrap().key, "accessToken");
        assert_eq!(b_changes.recv().await.unwrap().key, "user");
    }
}
