//! Bounded-concurrency upload pipeline
//!
//! One producer feeds [`FileTask`]s into a shared queue; a fixed pool of
//! workers drains it. Each task is received by exactly one worker and ends
//! in exactly one [`UploadOutcome`]. Per-file failures are counted and
//! reported through the [`EventSink`], never propagated.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_channel::{Receiver, Sender};
use bytes::Bytes;
use jiff::Timestamp;
use tokio::task::JoinSet;

use crate::config::{UploadConfig, worker_count};
use crate::content_type::guess_content_type;
use crate::error::{Error, Result};
use crate::events::{EventSink, FailureStage, UploadEvent};
use crate::key::{ObjectKey, to_key};
use crate::report::{RunCounters, RunReport};
use crate::traits::{LocalFs, ObjectAcl, ObjectStore, PutObjectRequest};

/// One file waiting to be uploaded
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
    pub root: Arc<PathBuf>,
}

/// Terminal result of one [`FileTask`]
#[derive(Debug)]
pub enum UploadOutcome {
    Success,
    Failure { stage: FailureStage, error: Error },
}

/// Per-run settings for the workers
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub bucket: String,
    pub concurrency: usize,
    pub cache_control: String,
    pub acl: ObjectAcl,
    pub key_prefix: Option<String>,
    pub queue_capacity: Option<usize>,
}

impl PipelineOptions {
    pub fn from_config(config: &UploadConfig, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            concurrency: config.concurrency,
            cache_control: config.cache_control.clone(),
            acl: config.acl,
            key_prefix: config.key_prefix.clone(),
            queue_capacity: config.queue_capacity,
        }
    }
}

/// Worker pool that uploads a list of files
pub struct UploadPipeline {
    store: Arc<dyn ObjectStore>,
    fs: Arc<dyn LocalFs>,
    sink: Arc<dyn EventSink>,
    options: Arc<PipelineOptions>,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        fs: Arc<dyn LocalFs>,
        sink: Arc<dyn EventSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            fs,
            sink,
            options: Arc::new(options),
        }
    }

    /// Upload every file in `files`, keyed relative to `root`
    ///
    /// Returns once all workers have drained the queue and exited.
    pub async fn run(&self, root: &Path, files: Vec<PathBuf>) -> RunReport {
        let total = files.len() as u64;
        let concurrency = worker_count(self.options.concurrency);
        let counters = Arc::new(RunCounters::new());
        let started_at = Timestamp::now();
        let start = Instant::now();

        let (tx, rx) = match self.options.queue_capacity {
            Some(capacity) => async_channel::bounded(capacity.max(1)),
            None => async_channel::unbounded(),
        };

        let mut workers = JoinSet::new();
        for id in 0..concurrency {
            let worker = Worker {
                id,
                queue: rx.clone(),
                store: self.store.clone(),
                fs: self.fs.clone(),
                sink: self.sink.clone(),
                options: self.options.clone(),
                counters: counters.clone(),
                total,
            };
            workers.spawn(worker.run());
        }
        drop(rx);

        self.sink.on_event(&UploadEvent::Started { total, concurrency });

        let producer = tokio::spawn(produce(tx, Arc::new(root.to_path_buf()), files));
        if let Err(e) = producer.await {
            tracing::error!(error = %e, "Upload producer failed");
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Upload worker panicked");
            }
        }

        // Files lost to a panicked worker still count, as failures.
        let accounted = counters.succeeded() + counters.failed();
        if accounted < total {
            let lost = total - accounted;
            tracing::error!(lost, "Files were queued but never finished");
            counters.add_failures(lost);
        }

        RunReport::from_counters(total, &counters, started_at, start.elapsed())
    }
}

/// Queue every file, then close the queue by dropping the sender
async fn produce(tx: Sender<FileTask>, root: Arc<PathBuf>, files: Vec<PathBuf>) {
    for path in files {
        let task = FileTask {
            path,
            root: root.clone(),
        };
        if tx.send(task).await.is_err() {
            tracing::error!("All upload workers exited before the queue was drained");
            return;
        }
    }
    tracing::debug!("All files queued");
}

struct Worker {
    id: usize,
    queue: Receiver<FileTask>,
    store: Arc<dyn ObjectStore>,
    fs: Arc<dyn LocalFs>,
    sink: Arc<dyn EventSink>,
    options: Arc<PipelineOptions>,
    counters: Arc<RunCounters>,
    total: u64,
}

impl Worker {
    async fn run(self) {
        // recv fails only once the queue is both empty and closed
        while let Ok(task) = self.queue.recv().await {
            self.handle(task).await;
        }
        tracing::debug!(worker = self.id, "Upload worker finished");
    }

    async fn handle(&self, task: FileTask) {
        let mut key = to_key(&task.root, &task.path);
        if let Some(prefix) = &self.options.key_prefix {
            key = key.with_prefix(prefix);
        }

        match self.upload(&task, &key).await {
            UploadOutcome::Success => {
                let succeeded = self.counters.record_success();
                self.sink.on_event(&UploadEvent::Uploaded {
                    key: &key,
                    succeeded,
                    total: self.total,
                });
            }
            UploadOutcome::Failure { stage, error } => {
                self.counters.record_failure();
                self.sink.on_event(&UploadEvent::Failed {
                    key: &key,
                    stage,
                    error: &error,
                });
            }
        }
    }

    async fn upload(&self, task: &FileTask, key: &ObjectKey) -> UploadOutcome {
        let body = match self.fs.read_file(&task.path).await {
            Ok(body) => body,
            Err(error) => {
                return UploadOutcome::Failure {
                    stage: FailureStage::Read,
                    error,
                };
            }
        };

        let request = PutObjectRequest {
            bucket: self.options.bucket.clone(),
            key: key.to_string(),
            body: Bytes::from(body),
            content_type: guess_content_type(&task.path).to_string(),
            cache_control: self.options.cache_control.clone(),
            acl: self.options.acl,
        };

        tracing::debug!(
            worker = self.id,
            key = %key,
            size = request.body.len(),
            content_type = %request.content_type,
            "Uploading object"
        );

        match self.store.put_object(request).await {
            Ok(()) => UploadOutcome::Success,
            Err(error) => UploadOutcome::Failure {
                stage: FailureStage::Upload,
                error,
            },
        }
    }
}

/// Enumerate `config.root` and upload everything under it to `bucket`
///
/// Only configuration and enumeration errors are returned; per-file
/// failures are reflected in the report.
pub async fn run(
    config: &UploadConfig,
    bucket: &str,
    fs: Arc<dyn LocalFs>,
    store: Arc<dyn ObjectStore>,
    sink: Arc<dyn EventSink>,
) -> Result<RunReport> {
    config.validate()?;
    if bucket.trim().is_empty() {
        return Err(Error::Config("bucket is required".to_string()));
    }

    let files = fs.list_regular_files(&config.root).await?;
    tracing::info!(
        root = %config.root.display(),
        files = files.len(),
        concurrency = worker_count(config.concurrency),
        "Starting upload"
    );

    let pipeline = UploadPipeline::new(store, fs, sink, PipelineOptions::from_config(config, bucket));
    let report = pipeline.run(&config.root, files).await;

    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Upload finished"
    );
    Ok(report)
}
