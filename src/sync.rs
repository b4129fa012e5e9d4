//! Directory upload and single-file download.

use crate::client::Client;
use crate::error::StoreError;
use crate::keys::{download_path, object_key};
use crate::transport::Transport;
use crate::types::StoredObject;
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

impl<T: Transport> Client<T> {
    /// Uploads every regular file below `dir` to `prefix/<relative path>`.
    ///
    /// Files are visited in lexical order (symlinks are followed) and
    /// uploaded one at a time, each with the content type its extension
    /// maps to. The first failure stops the upload; objects written before
    /// it stay in place.
    ///
    /// # Returns
    ///
    /// The keys written, in upload order.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use s3kit::{Client, MemoryTransport};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = Client::new("backups", MemoryTransport::new());
    /// let keys = client.upload_directory("snap", "./data").await?;
    /// println!("uploaded {} files", keys.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upload_directory(
        &self,
        prefix: &str,
        dir: impl AsRef<Path>,
    ) -> Result<Vec<String>, StoreError> {
        let dir = dir.as_ref();
        let mut uploaded = Vec::new();

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                debug!("Skipping non-regular file {}", entry.path().display());
                continue;
            }

            let key = self.upload_file(prefix, dir, entry.path()).await?;
            uploaded.push(key);
        }

        info!(
            "Uploaded {} files from {} to {}/{}",
            uploaded.len(),
            dir.display(),
            self.bucket(),
            prefix
        );
        Ok(uploaded)
    }

    /// Uploads one file located under `dir` and returns its key.
    ///
    /// `S3Transport` streams the file from disk. Other transports may fall
    /// back to [`Transport::put_file`]'s default, which holds the whole file
    /// in memory for the duration of the write.
    pub async fn upload_file(
        &self,
        prefix: &str,
        dir: impl AsRef<Path>,
        file: impl AsRef<Path>,
    ) -> Result<String, StoreError> {
        let file = file.as_ref();
        let key = object_key(prefix, dir.as_ref(), file)?;
        let content_type = self.content_types.for_path(file);

        let size = tokio::fs::metadata(file)
            .await
            .map_err(|e| StoreError::io(file, e))?
            .len();

        info!(
            "⬆️  {} -> {}/{} ({} bytes)",
            file.display(),
            self.bucket(),
            key,
            size
        );
        self.transport()
            .put_file(self.bucket(), &key, file, content_type)
            .await?;
        Ok(key)
    }

    /// Downloads `key` into `dest_root`, naming the file after the last key
    /// segment. Parent directories are created and an existing file is
    /// overwritten. A missing object is an error.
    ///
    /// # Returns
    ///
    /// The path of the written file.
    pub async fn download_file(
        &self,
        key: &str,
        dest_root: impl AsRef<Path>,
    ) -> Result<PathBuf, StoreError> {
        let destination = download_path(dest_root.as_ref(), key)?;

        let object = self
            .read_object(key)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                bucket: self.bucket().to_string(),
                key: key.to_string(),
            })?;

        if self.verify_checksums {
            verify_md5(key, &object)?;
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        tokio::fs::write(&destination, &object.body)
            .await
            .map_err(|e| StoreError::io(&destination, e))?;

        info!(
            "⬇️  {}/{} -> {} ({} bytes)",
            self.bucket(),
            key,
            destination.display(),
            object.body.len()
        );
        Ok(destination)
    }
}

/// Checks a body against its ETag when the ETag is a plain MD5.
fn verify_md5(key: &str, object: &StoredObject) -> Result<(), StoreError> {
    let Some(expected) = object.e_tag.as_deref() else {
        warn!("No ETag for {}. Cannot verify checksum.", key);
        return Ok(());
    };

    if !object.e_tag_is_md5() {
        debug!("ETag {} of {} is not an MD5 digest, skipping check", expected, key);
        return Ok(());
    }

    let actual = format!("{:x}", Md5::digest(&object.body));
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(StoreError::ChecksumMismatch {
            key: key.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    debug!("MD5 verified for {}", key);
    Ok(())
}
