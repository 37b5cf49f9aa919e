//! Session state and credential renewal
//!
//! - [`SessionStore`]: the current credential and identity, mirrored into a
//!   [`KeyValueStore`](crate::storage::KeyValueStore) and kept in step with
//!   other contexts sharing it
//! - [`RefreshCoordinator`]: the single-flight latch and queue used while a
//!   credential renewal is in progress
//! - [`AuthEvents`]: process-wide broadcast of session lifecycle events

pub mod events;
pub mod refresh;
pub mod session;
pub mod types;

pub use events::AuthEvents;
pub use refresh::{RefreshCancelled, RefreshCoordinator};
pub use session::SessionStore;
pub use types::{AuthEvent, LogoutReason, Session};
