//! Storage error types
//!
//! Errors raised by the key-value backends, convertible into the domain
//! error so callers above the storage layer only see `JigsawError`.

use jigsaw_domain::JigsawError;
use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage watch error: {0}")]
    Watch(String),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for JigsawError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => Self::Serialization(e.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_converts_to_domain_error() {
        let err = StorageError::Unavailable("disk full".to_string());
        assert_eq!(
            JigsawError::from(err),
            JigsawError::Storage("Storage unavailable: disk full".to_string())
        );

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            JigsawError::from(StorageError::from(parse)),
            JigsawError::Serialization(_)
        ));
    }
}
