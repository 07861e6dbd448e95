use super::ValidationError;

/// Errors that can occur during storage operations.
///
/// The taxonomy separates three caller-relevant classes: not-found
/// conditions (`BucketNotFound` / `ObjectNotFound`), transient failures
/// that persisted through the operation's retry budget (`Unavailable`),
/// and everything the backend refused outright (`Backend`).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Bucket does not exist
    #[error("Bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    /// Object does not exist
    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    /// Invalid bucket name or object key
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The operation failed on every attempt of its retry budget
    #[error("Storage unavailable after {attempts} attempt(s): {message}")]
    Unavailable { attempts: u32, message: String },

    /// Storage backend error
    #[error("Storage backend error: {message}")]
    Backend { message: String },
}

impl StorageError {
    /// Not-found conditions are expected results, never retried and never
    /// logged at error level.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::BucketNotFound { .. } | StorageError::ObjectNotFound { .. }
        )
    }

    /// Errors that retrying cannot fix: bad input or bad configuration.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            StorageError::Validation(_) | StorageError::Configuration { .. }
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
