//! Configuration loading
//!
//! Reads [`ClientConfig`](jigsaw_domain::ClientConfig) from files and
//! environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env, load, load_from_env, load_from_file, load_with, probe_config_paths};
