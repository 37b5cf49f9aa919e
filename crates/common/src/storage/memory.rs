//! In-process key-value backend

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::types::CHANGE_CHANNEL_CAPACITY;
use super::{ContextId, KeyValueStore, StorageChange, StorageResult, StorageSubscription};

struct Shared {
    entries: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

/// Handle onto a shared in-memory store
///
/// Cloning keeps the same context. Use [`MemoryStorage::context`] to model a
/// second tab: it sees the same entries and is notified of this handle's
/// writes (and vice versa).
#[derive(Clone)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
    context: ContextId,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared { entries: RwLock::new(HashMap::new()), changes }),
            context: ContextId::new(),
        }
    }

    /// New handle on the same backend with its own context identity
    pub fn context(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), context: ContextId::new() }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.shared.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.entries.read().is_empty()
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        // No subscribers is fine
        let _ = self.shared.changes.send(StorageChange::new(key, new_value, self.context));
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("context", &self.context)
            .field("len", &self.len())
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.shared.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.shared.entries.write().insert(key.to_string(), value.to_string());
        self.publish(key, Some(value.to_string()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let removed = self.shared.entries.write().remove(key);
        if removed.is_some() {
            self.publish(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.shared.changes.subscribe(), self.context)
    }

    fn context_id(&self) -> ContextId {
        self.context
    }
}
