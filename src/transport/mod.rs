//! Storage transports.
//!
//! A [`Transport`] performs single requests against the storage service.
//! Reads and existence checks answer with a [`Classification`] so that the
//! client never has to inspect error values to detect a missing object.

mod memory;
mod s3;

pub use memory::MemoryTransport;
pub use s3::S3Transport;

use crate::classify::Classification;
use crate::error::TransportError;
use crate::types::{ListPage, ObjectMeta, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::time::Duration;

/// Request primitives the client is built on.
///
/// Implementations perform no retries of their own beyond what the
/// underlying service SDK is configured to do.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches an object body.
    async fn get(&self, bucket: &str, key: &str) -> Classification<StoredObject>;

    /// Writes an object, replacing any previous value.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Writes the contents of a local file.
    ///
    /// The default reads the whole file and hands it to [`Transport::put`];
    /// transports that can stream from disk override it.
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
    ) -> Result<(), TransportError> {
        let body = tokio::fs::read(path)
            .await
            .map_err(|e| TransportError::new("PutObject", bucket, key, e))?;
        self.put(bucket, key, Bytes::from(body), content_type).await
    }

    /// Removes an object.
    async fn delete(&self, bucket: &str, key: &str) -> Classification<()>;

    /// Fetches object metadata without the body.
    async fn head(&self, bucket: &str, key: &str) -> Classification<ObjectMeta>;

    /// Lists one page of objects whose key starts with `prefix`.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, TransportError>;

    /// Produces a time-limited GET URL for `key`.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, TransportError>;
}
