//! Client configuration.

use crate::error::StoreError;
use std::env;

/// Static access keys, used instead of the default credential chain.
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Configuration for connecting to an S3-compatible store.
///
/// # Example
///
/// ```
/// use s3kit::S3Config;
///
/// let config = S3Config {
///     bucket: "my-bucket".to_string(),
///     endpoint_url: Some("http://localhost:9000".to_string()),
///     force_path_style: true,
///     ..S3Config::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket every key is resolved against.
    pub bucket: String,
    /// Region (default: `"us-east-1"`).
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    pub endpoint_url: Option<String>,
    /// Address buckets as `endpoint/bucket/key` instead of `bucket.endpoint/key`.
    pub force_path_style: bool,
    /// Explicit credentials; `None` uses the AWS default provider chain.
    pub credentials: Option<StaticCredentials>,
    /// Check downloaded bodies against their MD5 ETag (default: true).
    ///
    /// Objects the store reports as SSE-KMS or SSE-C encrypted are never
    /// checked, since their ETags are not MD5 digests of the content.
    pub verify_checksums: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            force_path_style: false,
            credentials: None,
            verify_checksums: true,
        }
    }
}

impl S3Config {
    /// Builds a configuration from the environment.
    ///
    /// Reads `S3KIT_BUCKET`, `AWS_REGION` (or `AWS_DEFAULT_REGION`),
    /// `AWS_ENDPOINT_URL`, `S3KIT_FORCE_PATH_STYLE` and, when both are set,
    /// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let credentials = match (lookup("AWS_ACCESS_KEY_ID"), lookup("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: lookup("AWS_SESSION_TOKEN"),
            }),
            _ => None,
        };

        Self {
            bucket: lookup("S3KIT_BUCKET").unwrap_or_default(),
            region: lookup("AWS_REGION")
                .or_else(|| lookup("AWS_DEFAULT_REGION"))
                .unwrap_or(defaults.region),
            endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|url| !url.is_empty()),
            force_path_style: lookup("S3KIT_FORCE_PATH_STYLE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.force_path_style),
            credentials,
            verify_checksums: defaults.verify_checksums,
        }
    }

    /// Rejects configurations that cannot address a bucket.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.bucket.trim().is_empty() {
            return Err(StoreError::Config("bucket name must not be empty".to_string()));
        }
        if self.region.trim().is_empty() {
            return Err(StoreError::Config("region must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_reads_all_fields() {
        let config = S3Config::from_lookup(lookup(&[
            ("S3KIT_BUCKET", "records"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
            ("AWS_ENDPOINT_URL", "http://localhost:9000"),
            ("S3KIT_FORCE_PATH_STYLE", "true"),
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]));

        assert_eq!(config.bucket, "records");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert!(config.force_path_style);
        let creds = config.credentials.unwrap();
        assert_eq!(creds.access_key_id, "AKIA");
        assert!(creds.session_token.is_none());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = S3Config::from_lookup(lookup(&[("AWS_ACCESS_KEY_ID", "AKIA")]));
        assert_eq!(config.region, "us-east-1");
        assert!(config.credentials.is_none());
        assert!(config.verify_checksums);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = StaticCredentials {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "hunter2".to_string(),
            session_token: None,
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
