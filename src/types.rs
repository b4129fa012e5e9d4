//! Data structures exchanged with the storage transport.

use bytes::Bytes;
use std::time::SystemTime;

/// An object body together with the metadata returned alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    /// Raw object bytes.
    pub body: Bytes,
    /// Content type recorded when the object was written, if any.
    pub content_type: Option<String>,
    /// ETag reported by the store, without surrounding quotes.
    pub e_tag: Option<String>,
    /// Server-side encryption the store applied (`AES256`, `aws:kms`,
    /// `aws:kms:dsse`), if reported.
    pub server_side_encryption: Option<String>,
    /// Algorithm of a customer-provided key (SSE-C), if one was used.
    pub sse_customer_algorithm: Option<String>,
}

impl StoredObject {
    /// Whether the ETag can be expected to be the MD5 of the body.
    ///
    /// SSE-KMS and SSE-C objects get opaque ETags, as do multipart uploads
    /// (`<hex>-<parts>`).
    pub fn e_tag_is_md5(&self) -> bool {
        if self.sse_customer_algorithm.is_some() {
            return false;
        }
        if self
            .server_side_encryption
            .as_deref()
            .is_some_and(|mode| mode.starts_with("aws:kms"))
        {
            return false;
        }
        self.e_tag
            .as_deref()
            .is_some_and(|tag| tag.len() == 32 && tag.bytes().all(|b| b.is_ascii_hexdigit()))
    }
}

/// Object metadata obtained without transferring the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Body size in bytes.
    pub size: u64,
    /// Content type recorded when the object was written, if any.
    pub content_type: Option<String>,
    /// ETag reported by the store, without surrounding quotes.
    pub e_tag: Option<String>,
}

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Body size in bytes.
    pub size: u64,
    /// ETag reported by the store, without surrounding quotes.
    pub e_tag: Option<String>,
    /// Last modification time, when the store reports one.
    pub last_modified: Option<SystemTime>,
}

/// A single page of a listing.
///
/// `next` is the continuation cursor for the following page; `None` means
/// the listing is complete.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub entries: Vec<ObjectSummary>,
    pub next: Option<String>,
}

/// Strips the quotes S3 puts around ETag values.
pub(crate) fn unquote_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}
