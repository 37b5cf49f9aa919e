//! API-specific error types
//!
//! Provides error classification for API operations and the messages a UI
//! layer shows for each failure.

use std::time::Duration;

use jigsaw_common::auth::RefreshCancelled;
use jigsaw_common::storage::StorageError;
use jigsaw_common::validation::{FieldErrors, ValidationError};
use jigsaw_domain::constants::{NETWORK_FAILED_MESSAGE, SESSION_EXPIRED_MESSAGE};
use jigsaw_domain::JigsawError;
use thiserror::Error;

/// Categories of API errors, for deciding what the user does next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Form input rejected before or by the server - fix and resubmit
    Validation,
    /// Authentication errors (401, 403, failed renewal) - sign in again
    Authentication,
    /// Rate limiting errors (429) - wait before trying again
    RateLimit,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except auth)
    Client,
    /// Network/connection errors and timeouts
    Network,
    /// Configuration and local errors
    Config,
}

/// API operation errors
///
/// `Clone` so that one renewal outcome can be handed to every request parked
/// behind it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Validation failed: {}", describe_fields(.0))]
    Validation(FieldErrors),

    #[error("{message}")]
    Rejected { status: u16, message: String, field_errors: FieldErrors },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Validation(_) => ApiErrorCategory::Validation,
            Self::Rejected { status, .. } => match status {
                401 | 403 => ApiErrorCategory::Authentication,
                429 => ApiErrorCategory::RateLimit,
                500..=599 => ApiErrorCategory::Server,
                _ => ApiErrorCategory::Validation,
            },
            Self::Auth(_) | Self::SessionExpired(_) => ApiErrorCategory::Authentication,
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) | Self::Storage(_) | Self::Cancelled => ApiErrorCategory::Config,
        }
    }

    /// Field-level messages, for client-side and remote validation failures
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Rejected { field_errors, .. } if !field_errors.is_empty() => Some(field_errors),
            _ => None,
        }
    }

    /// Message to show the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors
                .values()
                .next()
                .cloned()
                .unwrap_or_else(|| "Please check the highlighted fields".to_string()),
            Self::Rejected { message, .. } => message.clone(),
            Self::SessionExpired(_) | Self::Auth(_) => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::Network(_) | Self::Timeout(_) => NETWORK_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

fn describe_fields(errors: &FieldErrors) -> String {
    errors.iter().map(|(field, message)| format!("{field}: {message}")).collect::<Vec<_>>().join("; ")
}

impl From<RefreshCancelled> for ApiError {
    fn from(_: RefreshCancelled) -> Self {
        Self::Cancelled
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_field_errors())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<JigsawError> for ApiError {
    fn from(err: JigsawError) -> Self {
        match err {
            JigsawError::Network(msg) => Self::Network(msg),
            JigsawError::Auth(msg) => Self::Auth(msg),
            JigsawError::Config(msg) => Self::Config(msg),
            JigsawError::Storage(msg) => Self::Storage(msg),
            JigsawError::InvalidInput(msg)
            | JigsawError::Serialization(msg)
            | JigsawError::Internal(msg) => Self::Client(msg),
        }
    }
}
