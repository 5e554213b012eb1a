//! Error types for metrics store operations

use std::fmt;

/// Result type alias for metrics store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while shipping points to the metrics store
#[derive(Debug)]
pub enum StorageError {
    /// The store could not be reached (connect, TLS, timeout)
    ConnectionFailed(String),

    /// The store rejected the credentials
    Unauthorized(u16),

    /// The store answered with a non-success status
    WriteRejected { status: u16, body: String },

    /// Invalid configuration
    InvalidConfig(String),

    /// Backend-specific error
    BackendError(String),
}

impl StorageError {
    /// Whether the store rejected the configured credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, StorageError::Unauthorized(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed(msg) => {
                write!(f, "failed to connect to metrics store: {}", msg)
            }
            StorageError::Unauthorized(status) => {
                write!(f, "metrics store rejected credentials (HTTP {})", status)
            }
            StorageError::WriteRejected { status, body } => {
                write!(f, "metrics store rejected write (HTTP {}): {}", status, body)
            }
            StorageError::InvalidConfig(msg) => write!(f, "invalid store configuration: {}", msg),
            StorageError::BackendError(msg) => write!(f, "metrics store error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            StorageError::InvalidConfig(err.to_string())
        } else if err.is_connect() || err.is_timeout() || err.is_request() {
            StorageError::ConnectionFailed(err.to_string())
        } else {
            StorageError::BackendError(err.to_string())
        }
    }
}
