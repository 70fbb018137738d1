//! upload command - Upload a local directory tree to a bucket
//!
//! Every regular file under the directory is stored under its relative
//! path. Settings come from flags, then environment variables, then `.env`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use wp_core::{
    DEFAULT_CACHE_CONTROL, Error, LocalFs, ObjectAcl, OsFs, RetryBuilder, StoreConfig,
    UploadConfig, guess_content_type, resolve_concurrency, to_key,
};
use wp_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressSink};

/// Upload a directory to S3-compatible storage
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Directory to upload
    #[arg(env = "UPLOAD_DIR")]
    pub dir: Option<PathBuf>,

    /// Destination bucket
    #[arg(short, long, env = "WASABI_BUCKET")]
    pub bucket: Option<String>,

    /// Access key
    #[arg(long, env = "WASABI_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(long, env = "WASABI_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Region
    #[arg(long, env = "WASABI_REGION")]
    pub region: Option<String>,

    /// Custom endpoint URL
    #[arg(long, env = "WASABI_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Number of parallel uploads (defaults to 5 when unset or not positive)
    #[arg(short = 'P', long, env = "CONCURRENCY", allow_negative_numbers = true)]
    pub concurrency: Option<String>,

    /// Prefix prepended to every object key
    #[arg(long)]
    pub prefix: Option<String>,

    /// Cache-Control header for uploaded objects
    #[arg(long, default_value = DEFAULT_CACHE_CONTROL)]
    pub cache_control: String,

    /// Canned ACL for uploaded objects
    #[arg(long, default_value = "public-read")]
    pub acl: ObjectAcl,

    /// Maximum number of queued files (unbounded when unset)
    #[arg(long)]
    pub queue_size: Option<usize>,

    /// Use virtual-hosted-style bucket addressing
    #[arg(long)]
    pub virtual_host: bool,

    /// Maximum attempts per object for transient store errors
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Public base URL in front of the bucket, used by --urls
    #[arg(long, env = "CDN_URL")]
    pub cdn_url: Option<String>,

    /// Print the public URL of each uploaded object
    #[arg(long)]
    pub urls: bool,

    /// List what would be uploaded without uploading
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Serialize)]
struct PlanEntry {
    key: String,
    content_type: &'static str,
    size_bytes: u64,
    size_human: String,
    /// Set when the file's size could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    root: String,
    files: Vec<PlanEntry>,
    total_count: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let upload_config = match upload_config(&args) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    if args.dry_run {
        return plan(&upload_config, &formatter).await;
    }

    let store_config = match store_config(&args) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let client = match connect(&store_config).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::NetworkError;
        }
    };

    let mut sink = ProgressSink::new(formatter.clone(), !args.no_progress);
    if args.urls {
        sink = sink.with_urls(store_config.clone());
    }
    let sink = Arc::new(sink);

    let result = wp_core::run(
        &upload_config,
        &store_config.bucket,
        Arc::new(OsFs),
        Arc::new(client),
        sink.clone(),
    )
    .await;
    sink.finish();

    let report = match result {
        Ok(r) => r,
        Err(e @ Error::Config(_)) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::GeneralError;
        }
    };

    if formatter.is_json() {
        formatter.json(&report);
    } else {
        formatter.summary(&report.to_string());
    }

    if report.is_success() {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}

async fn connect(config: &StoreConfig) -> anyhow::Result<S3Client> {
    S3Client::new(config).await.with_context(|| {
        format!(
            "Failed to create client for bucket '{}' at {}",
            config.bucket,
            config.endpoint.as_deref().unwrap_or("the default endpoint")
        )
    })
}

fn upload_config(args: &UploadArgs) -> wp_core::Result<UploadConfig> {
    let root = args
        .dir
        .clone()
        .ok_or_else(|| Error::Config("upload directory is required (UPLOAD_DIR)".to_string()))?;

    let mut config = UploadConfig::new(root)
        .with_concurrency(resolve_concurrency(args.concurrency.as_deref()));
    config.cache_control = args.cache_control.clone();
    config.acl = args.acl;
    config.key_prefix = args.prefix.clone().filter(|p| !p.trim().is_empty());
    config.queue_capacity = args.queue_size;

    config.validate()?;
    Ok(config)
}

fn store_config(args: &UploadArgs) -> wp_core::Result<StoreConfig> {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut config = StoreConfig::new(
        non_empty(&args.bucket).unwrap_or_default(),
        non_empty(&args.access_key).unwrap_or_default(),
        non_empty(&args.secret_key).unwrap_or_default(),
    );
    if let Some(region) = non_empty(&args.region) {
        config.region = region;
    }
    config.endpoint = non_empty(&args.endpoint);
    config.cdn_url = non_empty(&args.cdn_url);
    config.force_path_style = !args.virtual_host;
    config.retry = RetryBuilder::new().max_attempts(args.retries).build();

    config.validate()?;
    Ok(config)
}

fn plan_entries(config: &UploadConfig, files: &[PathBuf]) -> Vec<PlanEntry> {
    files
        .iter()
        .map(|path| {
            let mut key = to_key(&config.root, path);
            if let Some(prefix) = &config.key_prefix {
                key = key.with_prefix(prefix);
            }
            let (size, error) = match std::fs::metadata(path) {
                Ok(meta) => (meta.len(), None),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot read file size");
                    (0, Some(e.to_string()))
                }
            };
            PlanEntry {
                key: key.into_string(),
                content_type: guess_content_type(path),
                size_bytes: size,
                size_human: humansize::format_size(size, humansize::BINARY),
                error,
            }
        })
        .collect()
}

/// Print the files that would be uploaded
async fn plan(config: &UploadConfig, formatter: &Formatter) -> ExitCode {
    let files = match OsFs.list_regular_files(&config.root).await {
        Ok(f) => f,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::GeneralError;
        }
    };

    let entries = plan_entries(config, &files);

    let total_size: u64 = entries.iter().map(|e| e.size_bytes).sum();
    let total_size_human = humansize::format_size(total_size, humansize::BINARY);

    if formatter.is_json() {
        formatter.json(&PlanOutput {
            root: config.root.display().to_string(),
            total_count: entries.len(),
            files: entries,
            total_size_bytes: total_size,
            total_size_human,
        });
        return ExitCode::Success;
    }

    formatter.println("Dry run mode - no files will be uploaded:");
    formatter.println("");
    for entry in &entries {
        let size = match &entry.error {
            Some(e) => formatter.style_dim(&format!("unreadable: {e}")),
            None => formatter.style_size(&entry.size_human),
        };
        formatter.println(&format!(
            "  + {} ({size}, {})",
            formatter.style_key(&entry.key),
            formatter.style_dim(entry.content_type)
        ));
    }
    formatter.println("");
    formatter.summary(&format!(
        "Would upload {} file(s), {total_size_human}",
        entries.len()
    ));

    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: UploadArgs,
    }

    fn parse(argv: &[&str]) -> UploadArgs {
        let mut full = vec!["test"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    #[test]
    fn test_upload_config_from_args() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_str().unwrap();
        let args = parse(&[path, "-P", "8", "--prefix", "site", "--acl", "private"]);

        let config = upload_config(&args).unwrap();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.key_prefix.as_deref(), Some("site"));
        assert_eq!(config.acl, ObjectAcl::Private);
        assert_eq!(config.cache_control, DEFAULT_CACHE_CONTROL);
    }

    #[test]
    fn test_non_positive_concurrency_uses_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_str().unwrap();
        let args = parse(&[path, "--concurrency=-2"]);
        assert_eq!(upload_config(&args).unwrap().concurrency, 5);
    }

    #[test]
    fn test_plan_marks_unreadable_files() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("a.css");
        std::fs::write(&present, b"body{}").unwrap();
        let vanished = dir.path().join("gone.png");

        let config = UploadConfig::new(dir.path()).with_key_prefix("site");
        let entries = plan_entries(&config, &[present, vanished]);

        assert_eq!(entries[0].key, "site/a.css");
        assert_eq!(entries[0].size_bytes, 6);
        assert!(entries[0].error.is_none());

        assert_eq!(entries[1].key, "site/gone.png");
        assert_eq!(entries[1].content_type, "image/png");
        assert_eq!(entries[1].size_bytes, 0);
        assert!(entries[1].error.is_some());
    }

    #[test]
    fn test_store_config_requires_credentials() {
        let args = parse(&["--bucket", "media", "--access-key", "ak", "--secret-key", " "]);
        let err = store_config(&args).unwrap_err();
        assert!(err.to_string().contains("secret key"));
    }

    #[test]
    fn test_store_config_from_args() {
        let args = parse(&[
            "--bucket",
            "media",
            "--access-key",
            "ak",
            "--secret-key",
            "sk",
            "--endpoint",
            "https://s3.ap-southeast-1.wasabisys.com",
            "--region",
            "ap-southeast-1",
            "--retries",
            "5",
        ]);
        let config = store_config(&args).unwrap();
        assert_eq!(config.region, "ap-southeast-1");
        assert!(config.force_path_style);
        assert_eq!(config.retry.max_attempts, 5);
    }
}
