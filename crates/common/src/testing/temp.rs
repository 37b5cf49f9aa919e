//! Temporary session files
//!
//! A scratch directory holding one session file, removed when dropped.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::path::{Path, PathBuf};

use crate::storage::{FileStorage, StorageResult};

const SESSION_FILE_NAME: &str = "session.json";

/// Temporary directory with a session file path inside it
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use jigsaw_common::storage::KeyValueStore;
/// use jigsaw_common::testing::SessionDir;
///
/// let dir = SessionDir::new().unwrap();
/// let storage = dir.open_storage().unwrap();
/// storage.set("accessToken", "tok-1").await.unwrap();
/// assert!(dir.read_raw().unwrap().contains("tok-1"));
/// # });
/// ```
#[derive(Debug)]
pub struct SessionDir {
    dir: tempfile::TempDir,
}

impl SessionDir {
    pub fn new() -> io::Result<Self> {
        Ok(Self { dir: tempfile::Builder::new().prefix("jigsaw-session").tempdir()? })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn session_file(&self) -> PathBuf {
        self.dir.path().join(SESSION_FILE_NAME)
    }

    /// Open a fresh [`FileStorage`] on the session file, as another process would
    pub fn open_storage(&self) -> StorageResult<FileStorage> {
        FileStorage::open(self.session_file())
    }

    /// Overwrite the session file directly, bypassing any storage handle
    pub fn write_raw(&self, contents: &str) -> io::Result<()> {
        std::fs::write(self.session_file(), contents)
    }

    pub fn read_raw(&self) -> io::Result<String> {
        std::fs::read_to_string(self.session_file())
    }
}
