//! Modular common utilities shared across Jigsaw crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: form validation
//! - `runtime`: session state, credential renewal coordination, key-value
//!   storage backends, auth event broadcast
//! - `test-utils`: mocks for the storage layer

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod validation;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;
#[cfg(feature = "runtime")]
pub mod storage;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use auth::{AuthEvent, AuthEvents, LogoutReason, RefreshCoordinator, SessionStore};
#[cfg(feature = "runtime")]
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageChange, StorageError};
#[cfg(feature = "foundation")]
pub use validation::{
    validate_login, validate_signup, EmailValidator, FieldErrors, FieldValidator,
    PasswordPolicy, StringValidator, ValidationError, ValidationResult,
};
