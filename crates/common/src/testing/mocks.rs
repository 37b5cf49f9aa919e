//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

#![allow(clippy::missing_errors_doc)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::storage::{
    ContextId, KeyValueStore, MemoryStorage, StorageError, StorageResult, StorageSubscription,
};

/// One call made against a [`MockStorage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Get(String),
    Set(String, String),
    Remove(String),
}

/// In-memory store that records every call and can be told to fail
///
/// Change notification behaves like [`MemoryStorage`]; use
/// [`MockStorage::context`] for a second context on the same data.
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use jigsaw_common::storage::KeyValueStore;
/// use jigsaw_common::testing::{MockStorage, StorageOp};
///
/// let storage = MockStorage::new();
/// storage.set("user", "{}").await.unwrap();
///
/// storage.fail_writes(true);
/// assert!(storage.set("user", "[]").await.is_err());
/// assert_eq!(storage.ops(), vec![
///     StorageOp::Set("user".to_string(), "{}".to_string()),
///     StorageOp::Set("user".to_string(), "[]".to_string()),
/// ]);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockStorage {
    inner: MemoryStorage,
    ops: Arc<Mutex<Vec<StorageOp>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            ops: Arc::new(Mutex::new(Vec::new())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Second context on the same data, with its own call log
    pub fn context(&self) -> Self {
        Self {
            inner: self.inner.context(),
            ops: Arc::new(Mutex::new(Vec::new())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent `get` fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` and `remove` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Calls made so far, in order
    pub fn ops(&self) -> Vec<StorageOp> {
        self.ops.lock().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().clear();
    }

    /// Current value, read without logging a call
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.ok().flatten()
    }

    fn record(&self, op: StorageOp) {
        self.ops.lock().push(op);
    }

    fn check(&self, flag: &AtomicBool) -> StorageResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("mock storage failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MockStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.record(StorageOp::Get(key.to_string()));
        self.check(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.record(StorageOp::Set(key.to_string(), value.to_string()));
        self.check(&self.fail_writes)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.record(StorageOp::Remove(key.to_string()));
        self.check(&self.fail_writes)?;
        self.inner.remove(key).await
    }

    fn subscribe(&self) -> StorageSubscription {
        self.inner.subscribe()
    }

    fn context_id(&self) -> ContextId {
        self.inner.context_id()
    }
}
