//! Bucket-scoped client: byte-level access, JSON records and presigned URLs.

use crate::config::S3Config;
use crate::content_type::ContentTypes;
use crate::error::StoreError;
use crate::transport::{S3Transport, Transport};
use crate::types::{ObjectMeta, ObjectSummary, StoredObject};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Content type recorded for objects written by [`Client::put_object`].
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A client bound to one bucket.
///
/// The client holds no mutable state, so one instance can serve concurrent
/// callers working on different keys. Nothing is retried here: every failure
/// is returned to the caller.
#[derive(Debug)]
pub struct Client<T = S3Transport> {
    bucket: String,
    transport: T,
    pub(crate) content_types: ContentTypes,
    pub(crate) verify_checksums: bool,
}

impl Client<S3Transport> {
    /// Connects to S3 using `config`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use s3kit::{Client, S3Config};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = S3Config { bucket: "records".to_string(), ..S3Config::default() };
    /// let client = Client::connect(&config).await?;
    /// client.put_object("users/1.json", &vec!["alice"]).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: &S3Config) -> Result<Self, StoreError> {
        let transport = S3Transport::connect(config).await?;
        Ok(Self::new(config.bucket.clone(), transport)
            .with_checksum_verification(config.verify_checksums))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(bucket: impl Into<String>, transport: T) -> Self {
        Self {
            bucket: bucket.into(),
            transport,
            content_types: ContentTypes::default(),
            verify_checksums: true,
        }
    }

    /// Replaces the extension table used by directory uploads.
    pub fn with_content_types(mut self, content_types: ContentTypes) -> Self {
        self.content_types = content_types;
        self
    }

    /// Enables or disables MD5 checks on downloaded files.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    // ==================== Object Operations ====================

    /// Reads an object body; `Ok(None)` if the key does not exist.
    pub async fn read(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self.read_object(key).await?.map(|object| object.body))
    }

    /// Reads an object body with its content type and ETag.
    pub async fn read_object(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        Ok(self.transport.get(&self.bucket, key).await.into_option()?)
    }

    /// Writes `body` to `key`, replacing any existing object.
    pub async fn write(
        &self,
        key: &str,
        body: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<(), StoreError> {
        self.transport
            .put(&self.bucket, key, body.into(), content_type)
            .await?;
        Ok(())
    }

    /// Deletes `key`. Deleting a key that does not exist succeeds.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self
            .transport
            .delete(&self.bucket, key)
            .await
            .into_option()?
            .is_none()
        {
            debug!("Delete of missing key {}/{}", self.bucket, key);
        }
        Ok(())
    }

    /// Returns whether `key` exists, without transferring its body.
    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.bucket_key_exists(&self.bucket, key).await
    }

    /// Returns whether `key` exists in another bucket reachable through the
    /// same transport.
    pub async fn bucket_key_exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self.transport.head(bucket, key).await.into_option()?.is_some())
    }

    /// Object metadata; `Ok(None)` if the key does not exist.
    pub async fn head(&self, key: &str) -> Result<Option<ObjectMeta>, StoreError> {
        Ok(self.transport.head(&self.bucket, key).await.into_option()?)
    }

    /// Lists every object whose key starts with `prefix` (`""` lists the
    /// whole bucket), following continuation tokens until the listing is
    /// complete.
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let mut entries = Vec::new();
        let mut continuation = None;

        loop {
            let page = self
                .transport
                .list_page(&self.bucket, prefix, continuation)
                .await?;
            entries.extend(page.entries);

            match page.next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        debug!(
            "Listed {} objects under {}/{}",
            entries.len(),
            self.bucket,
            prefix
        );
        Ok(entries)
    }

    // ==================== Records ====================

    /// Reads `key` and decodes it from JSON; `Ok(None)` if the key does not
    /// exist. Content that does not decode into `V` is an error.
    pub async fn get_object<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, StoreError> {
        let Some(body) = self.read(key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|source| StoreError::Serialization {
                key: key.to_string(),
                source,
            })
    }

    /// Encodes `value` as indented JSON and writes it to `key`.
    pub async fn put_object<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.write(key, body, Some(JSON_CONTENT_TYPE)).await
    }

    /// Writes a zero-length object with no content type.
    pub async fn put_empty(&self, key: &str) -> Result<(), StoreError> {
        self.write(key, Bytes::new(), None).await
    }

    // ==================== Raw Content ====================

    /// Reads `key` as UTF-8 text; `Ok(None)` if the key does not exist.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let Some(body) = self.read(key).await? else {
            return Ok(None);
        };
        String::from_utf8(body.to_vec())
            .map(Some)
            .map_err(|source| StoreError::InvalidUtf8 {
                key: key.to_string(),
                source,
            })
    }

    /// Writes raw content with the given content type.
    pub async fn put_content(
        &self,
        key: &str,
        body: impl Into<Bytes>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.write(key, body, Some(content_type)).await
    }

    /// Reads `reader` to the end once and writes the result to `key`.
    pub async fn put_reader<R>(
        &self,
        key: &str,
        mut reader: R,
        content_type: &str,
    ) -> Result<(), StoreError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .await
            .map_err(|e| StoreError::io(key, e))?;
        self.put_content(key, body, content_type).await
    }

    // ==================== Presigned Access ====================

    /// A URL granting GET access to `key` for `expires_in`.
    ///
    /// The key is not checked for existence.
    pub async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String, StoreError> {
        Ok(self
            .transport
            .presign_get(&self.bucket, key, expires_in)
            .await?)
    }
}
