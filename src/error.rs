//! Error types for object storage operations.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by a [`TransportError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failed call against the storage service that was not a "not found".
///
/// The original cause is kept as the error source; `code` holds the service
/// error code (e.g. `AccessDenied`) when the service returned one.
#[derive(Error, Debug)]
#[error("{operation} {bucket}/{key} failed: {message}")]
pub struct TransportError {
    /// Name of the remote operation (e.g. `GetObject`).
    pub operation: &'static str,
    /// Bucket the request was addressed to.
    pub bucket: String,
    /// Key (or list prefix) the request was addressed to.
    pub key: String,
    /// Service error code, if the service sent one.
    pub code: Option<String>,
    message: String,
    #[source]
    source: BoxError,
}

impl TransportError {
    /// Wraps `source` as the cause of a failed `operation` on `bucket/key`.
    pub fn new(
        operation: &'static str,
        bucket: impl Into<String>,
        key: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        let source = source.into();
        Self {
            operation,
            bucket: bucket.into(),
            key: key.into(),
            code: None,
            message: source.to_string(),
            source,
        }
    }

    /// Replaces the rendered message (used for SDK errors whose `Display` is terse).
    pub(crate) fn with_message(mut self, message: String) -> Self {
        self.message = message;
        self
    }

    /// Attaches the service error code.
    pub(crate) fn with_code(mut self, code: Option<&str>) -> Self {
        self.code = code.map(str::to_owned);
        self
    }
}

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The storage service rejected or failed the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An object that had to exist was not found.
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// JSON serialization/deserialization error.
    #[error("Failed to (de)serialize {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored content requested as text is not valid UTF-8.
    #[error("Object {key} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        key: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// I/O error on a local file or directory.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error while walking a local directory tree.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// A key that cannot be mapped to or from a local path.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A file given for upload does not live under the upload root.
    #[error("{} is not located under {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// Downloaded bytes do not match the MD5 ETag reported by the store.
    #[error("MD5 mismatch for {key}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
