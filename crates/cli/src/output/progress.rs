//! Upload progress display
//!
//! Turns pipeline events into terminal output: one line per uploaded or
//! failed file, above an optional progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use wp_core::{EventSink, StoreConfig, UploadEvent};

use super::Formatter;

/// Event sink that prints upload progress
pub struct ProgressSink {
    formatter: Formatter,
    bar: Option<ProgressBar>,
    /// When set, successful uploads also print their public URL
    urls: Option<StoreConfig>,
}

impl ProgressSink {
    pub fn new(formatter: Formatter, show_bar: bool) -> Self {
        let bar = (show_bar && !formatter.is_json() && !formatter.is_quiet()).then(|| {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("Valid template")
                    .progress_chars("#>-"),
            );
            pb.set_message("Uploading...");
            pb
        });

        Self {
            formatter,
            bar,
            urls: None,
        }
    }

    /// Print the public URL of each uploaded object
    pub fn with_urls(mut self, store: StoreConfig) -> Self {
        self.urls = Some(store);
        self
    }

    /// Remove the progress bar once the run is over
    pub fn finish(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
    }

    fn print(&self, line: String) {
        match &self.bar {
            Some(pb) => pb.println(line),
            None => self.formatter.println(&line),
        }
    }
}

impl EventSink for ProgressSink {
    fn on_event(&self, event: &UploadEvent<'_>) {
        match event {
            UploadEvent::Started { total, concurrency } => {
                if let Some(pb) = &self.bar {
                    pb.set_length(*total);
                }
                if !self.formatter.is_json() {
                    self.print(format!(
                        "Found {total} files, uploading with {concurrency} workers"
                    ));
                }
            }
            UploadEvent::Uploaded {
                key,
                succeeded,
                total,
            } => {
                if let Some(pb) = &self.bar {
                    pb.inc(1);
                }
                if self.formatter.is_json() {
                    return;
                }
                let mut line = format!(
                    "[{succeeded}/{total}] uploaded: {}",
                    self.formatter.style_key(key.as_str())
                );
                if let Some(store) = &self.urls {
                    let url = store.public_url(key.as_str());
                    line.push_str(&format!(" -> {}", self.formatter.style_url(&url)));
                }
                self.print(line);
            }
            UploadEvent::Failed { .. } => {
                if let Some(pb) = &self.bar {
                    pb.inc(1);
                    pb.println(self.formatter.format_error(&event.to_string()));
                } else {
                    self.formatter.error(&event.to_string());
                }
            }
        }
    }
}
