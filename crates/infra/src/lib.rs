//! # Jigsaw Infrastructure
//!
//! Impure side of the Jigsaw session client.
//!
//! This crate contains:
//! - The HTTP transport with its cookie jar
//! - The authenticated API client (credential renewal, login, signup,
//!   logout)
//! - Configuration loading from files and the environment
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Session state and renewal coordination come from `jigsaw-common`
//! - Wire types and constants come from `jigsaw-domain`
//! - Contains all network and filesystem I/O outside the storage backends

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, ApiClientConfig, ApiError, ApiErrorCategory};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_tracing, LogFormat};
