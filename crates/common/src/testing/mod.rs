//! Testing utilities and helpers
//!
//! - **[`mocks`]**: [`MockStorage`], a recording key-value store with
//!   failure injection
//! - **[`temp`]**: [`SessionDir`], a scratch directory for file-backed
//!   sessions

pub mod mocks;
pub mod temp;

pub use mocks::{MockStorage, StorageOp};
pub use temp::SessionDir;
