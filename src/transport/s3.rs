//! Transport backed by the AWS S3 SDK.

use super::Transport;
use crate::classify::{classify, transport_error, Classification};
use crate::config::S3Config;
use crate::error::{StoreError, TransportError};
use crate::types::{unquote_etag, ListPage, ObjectMeta, ObjectSummary, StoredObject};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

/// Speaks to S3 (or an S3-compatible store) through `aws-sdk-s3`.
#[derive(Debug, Clone)]
pub struct S3Transport {
    client: aws_sdk_s3::Client,
}

impl S3Transport {
    /// Wraps an already configured SDK client.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Builds an SDK client from `config`.
    ///
    /// Credentials come from `config.credentials` when set, otherwise from the
    /// AWS default provider chain (environment, profile, instance metadata).
    pub async fn connect(config: &S3Config) -> Result<Self, StoreError> {
        config.validate()?;

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let Some(endpoint_url) = &config.endpoint_url {
            info!("Using S3 endpoint {}", endpoint_url);
            loader = loader.endpoint_url(endpoint_url);
        }

        if let Some(creds) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                creds.session_token.clone(),
                None,
                "s3kit",
            ));
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self::new(aws_sdk_s3::Client::from_conf(s3_config)))
    }

    /// The underlying SDK client.
    pub fn sdk(&self) -> &aws_sdk_s3::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for S3Transport {
    async fn get(&self, bucket: &str, key: &str) -> Classification<StoredObject> {
        debug!("GetObject {}/{}", bucket, key);
        let result = self.client.get_object().bucket(bucket).key(key).send().await;

        let output = match classify("GetObject", bucket, key, result) {
            Classification::Found(output) => output,
            Classification::NotFound => return Classification::NotFound,
            Classification::Error(err) => return Classification::Error(err),
        };

        let content_type = output.content_type().map(str::to_owned);
        let e_tag = output.e_tag().map(unquote_etag);
        let server_side_encryption = output
            .server_side_encryption()
            .map(|mode| mode.as_str().to_owned());
        let sse_customer_algorithm = output.sse_customer_algorithm().map(str::to_owned);

        match output.body.collect().await {
            Ok(data) => Classification::Found(StoredObject {
                body: data.into_bytes(),
                content_type,
                e_tag,
                server_side_encryption,
                sse_customer_algorithm,
            }),
            Err(e) => Classification::Error(TransportError::new("GetObject", bucket, key, e)),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), TransportError> {
        debug!("PutObject {}/{} ({} bytes)", bucket, key, body.len());
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_owned))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| transport_error("PutObject", bucket, key, e))
    }

    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
    ) -> Result<(), TransportError> {
        debug!("PutObject {}/{} from {}", bucket, key, path.display());
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| TransportError::new("PutObject", bucket, key, e))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .set_content_type(content_type.map(str::to_owned))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| transport_error("PutObject", bucket, key, e))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Classification<()> {
        debug!("DeleteObject {}/{}", bucket, key);
        let result = self.client.delete_object().bucket(bucket).key(key).send().await;
        classify("DeleteObject", bucket, key, result).map(|_| ())
    }

    async fn head(&self, bucket: &str, key: &str) -> Classification<ObjectMeta> {
        debug!("HeadObject {}/{}", bucket, key);
        let result = self.client.head_object().bucket(bucket).key(key).send().await;

        classify("HeadObject", bucket, key, result).map(|output| ObjectMeta {
            size: output.content_length().unwrap_or(0).max(0) as u64,
            content_type: output.content_type().map(str::to_owned),
            e_tag: output.e_tag().map(unquote_etag),
        })
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, TransportError> {
        debug!("ListObjectsV2 {}/{}", bucket, prefix);
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix((!prefix.is_empty()).then(|| prefix.to_string()))
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| transport_error("ListObjectsV2", bucket, prefix, e))?;

        let entries = output
            .contents()
            .iter()
            .filter_map(|object| {
                Some(ObjectSummary {
                    key: object.key()?.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    e_tag: object.e_tag().map(unquote_etag),
                    last_modified: object
                        .last_modified()
                        .and_then(|t| SystemTime::try_from(*t).ok()),
                })
            })
            .collect();

        let next = if output.is_truncated().unwrap_or(false) {
            match output.next_continuation_token() {
                Some(token) => Some(token.to_string()),
                None => {
                    return Err(TransportError::new(
                        "ListObjectsV2",
                        bucket,
                        prefix,
                        "truncated listing without a continuation token",
                    ))
                }
            }
        } else {
            None
        };

        Ok(ListPage { entries, next })
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, TransportError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| TransportError::new("PresignGetObject", bucket, key, e))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| transport_error("PresignGetObject", bucket, key, e))?;

        Ok(request.uri().to_string())
    }
}
