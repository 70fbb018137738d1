//! wp-core: Core library for the wasabi-push uploader
//!
//! This crate provides everything that does not depend on a particular
//! object store SDK:
//! - Local file enumeration and object key derivation
//! - Content-Type lookup
//! - The bounded-concurrency upload pipeline and its run report
//! - Configuration types, errors and retry helpers
//! - The `ObjectStore` and `LocalFs` traits the pipeline talks to
//!
//! The S3 implementation of `ObjectStore` lives in `wp-s3`.

pub mod config;
pub mod content_type;
pub mod error;
pub mod events;
pub mod key;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod traits;
pub mod walk;

pub use config::{
    DEFAULT_CACHE_CONTROL, DEFAULT_CONCURRENCY, RetryConfig, StoreConfig, UploadConfig,
    resolve_concurrency, worker_count,
};
pub use content_type::{DEFAULT_CONTENT_TYPE, guess_content_type};
pub use error::{Error, Result};
pub use events::{EventSink, FailureStage, TracingSink, UploadEvent};
pub use key::{ObjectKey, to_key};
pub use pipeline::{FileTask, PipelineOptions, UploadOutcome, UploadPipeline, run};
pub use report::{RunCounters, RunReport};
pub use retry::{RetryBuilder, is_retryable_error, retry_with_backoff};
pub use traits::{LocalFs, ObjectAcl, ObjectStore, PutObjectRequest};
pub use walk::{OsFs, collect_files};
