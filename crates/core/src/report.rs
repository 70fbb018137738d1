//! Run counters and the final report

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use jiff::Timestamp;
use serde::{Serialize, Serializer};

/// Success and failure counts shared by the workers of one run
#[derive(Debug, Default)]
pub struct RunCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a success and return the new success total
    pub fn record_success(&self) -> u64 {
        self.succeeded.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count a failure and return the new failure total
    pub fn record_failure(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count `n` failures at once
    pub fn add_failures(&self, n: u64) {
        self.failed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub total_files: u64,
    pub succeeded: u64,
    pub failed: u64,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub started_at: Timestamp,
}

impl RunReport {
    /// Build the report from the final counter values
    pub fn from_counters(
        total_files: u64,
        counters: &RunCounters,
        started_at: Timestamp,
        elapsed: Duration,
    ) -> Self {
        Self {
            total_files,
            succeeded: counters.succeeded(),
            failed: counters.failed(),
            elapsed,
            started_at,
        }
    }

    /// A run passes only when no file failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status for this run
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Upload complete: {} files, {} succeeded, {} failed in {:.2?}",
            self.total_files, self.succeeded, self.failed, self.elapsed
        )
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}
