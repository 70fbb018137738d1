//! Run configuration
//!
//! `StoreConfig` describes where objects go, `UploadConfig` describes what is
//! uploaded and how. Both are plain values filled in by the caller (the CLI
//! reads them from flags, the environment and `.env`) and checked with
//! `validate()` before a run starts.

use std::path::PathBuf;

use url::Url;

use crate::error::{Error, Result};
use crate::traits::ObjectAcl;

/// Worker count used when none (or a non-positive one) is configured
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Cache directive attached to every uploaded object by default
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Number of workers to run for a configured concurrency
///
/// Zero means unspecified and resolves to [`DEFAULT_CONCURRENCY`].
pub fn worker_count(concurrency: usize) -> usize {
    if concurrency == 0 {
        DEFAULT_CONCURRENCY
    } else {
        concurrency
    }
}

/// Resolve a raw concurrency setting
///
/// Missing, unparsable, zero or negative values all resolve to
/// [`DEFAULT_CONCURRENCY`].
pub fn resolve_concurrency(raw: Option<&str>) -> usize {
    let parsed = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|&n| n > 0)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    worker_count(parsed)
}

/// Retry configuration for object store requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
        }
    }
}

/// Object store connection settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Custom endpoint URL (Wasabi, MinIO, ...). `None` uses the SDK default.
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`
    pub force_path_style: bool,
    /// Public base URL that fronts the bucket
    pub cdn_url: Option<String>,
    pub retry: RetryConfig,
}

impl StoreConfig {
    /// Create a config with the required settings and defaults for the rest
    pub fn new(
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            bucket: bucket.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            force_path_style: true,
            cdn_url: None,
            retry: RetryConfig::default(),
        }
    }

    /// Check that the required settings are present and well-formed
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.bucket.trim().is_empty() {
            missing.push("bucket");
        }
        if self.access_key.trim().is_empty() {
            missing.push("access key");
        }
        if self.secret_key.trim().is_empty() {
            missing.push("secret key");
        }
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.region.trim().is_empty() {
            return Err(Error::Config("region must not be empty".to_string()));
        }

        if let Some(endpoint) = &self.endpoint {
            Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
        }

        if let Some(cdn) = &self.cdn_url {
            Url::parse(cdn).map_err(|e| Error::Config(format!("invalid CDN URL '{cdn}': {e}")))?;
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry attempts must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Public URL of an uploaded object
    ///
    /// Prefers the CDN base, then the configured endpoint (path-style), then
    /// the regional Wasabi endpoint.
    pub fn public_url(&self, key: &str) -> String {
        if let Some(cdn) = &self.cdn_url {
            return format!("{}/{key}", cdn.trim_end_matches('/'));
        }
        if let Some(endpoint) = &self.endpoint {
            return format!("{}/{}/{key}", endpoint.trim_end_matches('/'), self.bucket);
        }
        format!("https://s3.{}.wasabisys.com/{}/{key}", self.region, self.bucket)
    }
}

/// What to upload and how
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory whose contents are uploaded
    pub root: PathBuf,
    /// Number of concurrent upload workers
    pub concurrency: usize,
    pub cache_control: String,
    pub acl: ObjectAcl,
    /// Prepended to every object key
    pub key_prefix: Option<String>,
    /// Bound on queued files. `None` means an unbounded queue.
    pub queue_capacity: Option<usize>,
}

impl UploadConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            concurrency: DEFAULT_CONCURRENCY,
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            acl: ObjectAcl::default(),
            key_prefix: None,
            queue_capacity: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Check that the root is an existing directory
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::Config("upload directory is required".to_string()));
        }

        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::Config(format!(
                    "{} is not a directory",
                    self.root.display()
                )));
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "cannot access upload directory {}: {e}",
                    self.root.display()
                )));
            }
        }

        if self.queue_capacity == Some(0) {
            return Err(Error::Config("queue capacity must be at least 1".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_concurrency() {
        assert_eq!(resolve_concurrency(None), DEFAULT_CONCURRENCY);
        assert_eq!(resolve_concurrency(Some("")), DEFAULT_CONCURRENCY);
        assert_eq!(resolve_concurrency(Some("0")), DEFAULT_CONCURRENCY);
        assert_eq!(resolve_concurrency(Some("-3")), DEFAULT_CONCURRENCY);
        assert_eq!(resolve_concurrency(Some("many")), DEFAULT_CONCURRENCY);
        assert_eq!(resolve_concurrency(Some(" 12 ")), 12);
        assert_eq!(resolve_concurrency(Some("1")), 1);
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(0), DEFAULT_CONCURRENCY);
        assert_eq!(worker_count(1), 1);
        assert_eq!(worker_count(32), 32);
    }

    #[test]
    fn test_store_config_missing_settings() {
        let config = StoreConfig::new("", "ak", "");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("bucket"));
        assert!(err.contains("secret key"));
        assert!(!err.contains("access key"));
    }

    #[test]
    fn test_store_config_invalid_endpoint() {
        let mut config = StoreConfig::new("media", "ak", "sk");
        config.endpoint = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.endpoint = Some("https://s3.ap-southeast-1.wasabisys.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_public_url() {
        let mut config = StoreConfig::new("media", "ak", "sk");
        config.region = "ap-southeast-1".to_string();
        assert_eq!(
            config.public_url("img/a.png"),
            "https://s3.ap-southeast-1.wasabisys.com/media/img/a.png"
        );

        config.endpoint = Some("http://localhost:9000/".to_string());
        assert_eq!(config.public_url("a.png"), "http://localhost:9000/media/a.png");

        config.cdn_url = Some("https://cdn.example.com/".to_string());
        assert_eq!(config.public_url("a.png"), "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_upload_config_validate() {
        let dir = TempDir::new().unwrap();
        assert!(UploadConfig::new(dir.path()).validate().is_ok());

        let missing = UploadConfig::new(dir.path().join("missing"));
        assert!(matches!(missing.validate(), Err(Error::Config(_))));

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(UploadConfig::new(&file).validate(), Err(Error::Config(_))));

        let zero = UploadConfig::new(dir.path()).with_concurrency(0);
        assert!(zero.validate().is_ok());

        let unbounded_zero = UploadConfig::new(dir.path()).with_queue_capacity(0);
        assert!(unbounded_zero.validate().is_err());
    }

    #[test]
    fn test_upload_config_defaults() {
        let config = UploadConfig::new("/data");
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.cache_control, DEFAULT_CACHE_CONTROL);
        assert_eq!(config.acl, ObjectAcl::PublicRead);
        assert!(config.queue_capacity.is_none());
    }
}
