//! Output handling
//!
//! Human-readable and JSON output, plus the progress display used during
//! uploads.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressSink;

/// Output settings shared by all commands
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit strict JSON instead of human-readable text
    pub json: bool,
    /// Disable colors
    pub no_color: bool,
    /// Suppress everything except errors and the final summary
    pub quiet: bool,
}
