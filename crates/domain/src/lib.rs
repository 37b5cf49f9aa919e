//! # Jigsaw Domain
//!
//! Domain types shared by the Jigsaw session client.
//!
//! This crate contains:
//! - Wire types for the authentication API (login, signup, refresh)
//! - The user identity record returned by the API
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Fixed constants (storage keys, endpoint paths, cookie names)
//!
//! ## Architecture
//! - No dependencies on other Jigsaw crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
