//! Storage change notifications

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

/// Capacity of the change channel shared by all contexts of one backend
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Identifies one execution context (a "tab") sharing a storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Fresh, unique context identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Origin stamped on changes detected outside this process
    pub const fn external() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_external(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_external() {
            f.write_str("external")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A write observed on the shared store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChange {
    pub key: String,
    /// New value, `None` when the key was removed
    pub new_value: Option<String>,
    pub origin: ContextId,
}

impl StorageChange {
    pub fn new(key: impl Into<String>, new_value: Option<String>, origin: ContextId) -> Self {
        Self { key: key.into(), new_value, origin }
    }

    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Receiver of changes made by contexts other than the subscriber
pub struct StorageSubscription {
    receiver: broadcast::Receiver<StorageChange>,
    context: ContextId,
}

impl StorageSubscription {
    pub(crate) fn new(receiver: broadcast::Receiver<StorageChange>, context: ContextId) -> Self {
        Self { receiver, context }
    }

    /// Wait for the next change from another context
    ///
    /// Returns `None` once the backend has been dropped. Changes lost because
    /// the subscriber fell behind are skipped with a warning.
    pub async fn recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.origin == self.context => {}
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(context = %self.context, skipped, "storage subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
