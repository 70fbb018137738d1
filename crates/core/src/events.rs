//! Progress events emitted by the upload pipeline
//!
//! The pipeline never prints. Every user-visible line goes through an
//! [`EventSink`] supplied by the caller.

use std::fmt;

use crate::error::Error;
use crate::key::ObjectKey;

/// Which step of a file's upload failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Read,
    Upload,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Read => f.write_str("read"),
            FailureStage::Upload => f.write_str("upload"),
        }
    }
}

/// Something that happened during a run
#[derive(Debug)]
pub enum UploadEvent<'a> {
    /// Workers are running and `total` files are about to be queued
    Started { total: u64, concurrency: usize },
    /// A file was stored; `succeeded` is the success count including it
    Uploaded {
        key: &'a ObjectKey,
        succeeded: u64,
        total: u64,
    },
    Failed {
        key: &'a ObjectKey,
        stage: FailureStage,
        error: &'a Error,
    },
}

impl fmt::Display for UploadEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadEvent::Started { total, concurrency } => {
                write!(f, "uploading {total} files with {concurrency} workers")
            }
            UploadEvent::Uploaded {
                key,
                succeeded,
                total,
            } => write!(f, "[{succeeded}/{total}] uploaded: {key}"),
            UploadEvent::Failed { key, stage, error } => {
                write!(f, "failed to {stage} {key}: {error}")
            }
        }
    }
}

/// Receiver of pipeline events
///
/// Called concurrently from every worker.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &UploadEvent<'_>);
}

/// Sink that forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: &UploadEvent<'_>) {
        match event {
            UploadEvent::Started { .. } => tracing::info!("{event}"),
            UploadEvent::Uploaded { .. } => tracing::info!("{event}"),
            UploadEvent::Failed { .. } => tracing::warn!("{event}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::to_key;
    use std::path::Path;

    #[test]
    fn test_event_lines() {
        let key = to_key(Path::new("/r"), Path::new("/r/img/a.png"));

        let uploaded = UploadEvent::Uploaded {
            key: &key,
            succeeded: 3,
            total: 10,
        };
        assert_eq!(uploaded.to_string(), "[3/10] uploaded: img/a.png");

        let error = Error::Transfer("Service error: AccessDenied".to_string());
        let failed = UploadEvent::Failed {
            key: &key,
            stage: FailureStage::Upload,
            error: &error,
        };
        assert_eq!(
            failed.to_string(),
            "failed to upload img/a.png: Service error: AccessDenied"
        );

        let error = Error::Read(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        let failed = UploadEvent::Failed {
            key: &key,
            stage: FailureStage::Read,
            error: &error,
        };
        assert_eq!(
            failed.to_string(),
            "failed to read img/a.png: permission denied"
        );
    }
}
