//! Persistent key-value storage
//!
//! A small string-to-string store shared by several execution contexts.
//! Every write is announced to the *other* contexts sharing the backend as a
//! [`StorageChange`]; the writer never sees its own changes.
//!
//! Two backends are provided:
//! - [`MemoryStorage`]: in-process, one handle per context via
//!   [`MemoryStorage::context`]
//! - [`FileStorage`]: a JSON file replaced atomically on every write, with
//!   [`FileStorage::watch`] picking up writes made by other processes

pub mod error;
pub mod file;
pub mod memory;
pub mod types;

use async_trait::async_trait;

pub use error::{StorageError, StorageResult};
pub use file::{FileStorage, WatchHandle};
pub use memory::MemoryStorage;
pub use types::{ContextId, StorageChange, StorageSubscription};

/// Asynchronous key-value store with cross-context change notification
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Subscribe to changes made by other contexts
    fn subscribe(&self) -> StorageSubscription;

    /// Identity of this handle; stamped on the changes it produces
    fn context_id(&self) -> ContextId;
}
