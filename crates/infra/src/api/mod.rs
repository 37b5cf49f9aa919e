//! Authenticated API client for the Jigsaw backend
//!
//! # Architecture
//!
//! - Uses [`HttpClient`](crate::http::HttpClient) (no direct reqwest)
//! - Bearer credential from the shared
//!   [`SessionStore`](jigsaw_common::auth::SessionStore)
//! - `401` responses renew the credential through the refresh cookie and
//!   replay the request once; concurrent renewals coalesce into one exchange
//! - Explicit timeout on every request and every renewal

pub mod auth;
pub mod client;
pub mod errors;

pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use errors::{ApiError, ApiErrorCategory};
