//! Command implementations

pub mod completions;
pub mod upload;

use clap::Subcommand;

/// wasabi-push subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a directory tree to a bucket
    Upload(upload::UploadArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}
