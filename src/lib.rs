//! s3kit - Records, raw content and directory trees in S3-compatible object storage
//!
//! This library wraps a bucket of an S3-compatible store behind a small client
//! that knows how to tell "not found" apart from real failures, how to map a
//! local directory tree onto keys and back, and how to pick a content type
//! for an uploaded file.
//!
//! # Features
//!
//! - **Uniform Not-Found Handling**: Every read returns `Ok(None)` / `Ok(false)` for a missing key
//! - **JSON Records**: Store and load any `serde` type
//! - **Directory Upload**: Mirror a local tree under a key prefix, with content types by extension
//! - **Verified Downloads**: Downloaded files are checked against their MD5 ETag
//! - **Presigned URLs**: Time-limited GET links for a key
//! - **Pluggable Transport**: AWS SDK for real buckets, in-memory store for tests
//!
//! The store is eventually consistent; nothing here hides that. No request is
//! retried by this crate.
//!
//! # Example
//!
//! ```no_run
//! use s3kit::{Client, S3Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = S3Config::from_env();
//! let client = Client::connect(&config).await?;
//!
//! client.upload_directory("snap", "./data").await?;
//! for object in client.list("snap/").await? {
//!     println!("{} ({} bytes)", object.key, object.size);
//! }
//! client.download_file("snap/sub/b.txt", "./out").await?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod content_type;
pub mod error;
pub mod keys;
mod sync;
pub mod transport;
pub mod types;

pub use classify::Classification;
pub use client::{Client, JSON_CONTENT_TYPE};
pub use config::{S3Config, StaticCredentials};
pub use content_type::ContentTypes;
pub use error::{StoreError, TransportError};
pub use transport::{MemoryTransport, S3Transport, Transport};
pub use types::{ListPage, ObjectMeta, ObjectSummary, StoredObject};
