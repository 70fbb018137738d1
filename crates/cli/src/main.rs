//! wasabi-push - Bulk upload of a local directory to S3-compatible storage

mod commands;
mod exit_code;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Commands;
use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Upload a directory tree to Wasabi or any S3-compatible bucket
#[derive(Parser, Debug)]
#[command(name = "wasabi-push", version, about, long_about = None)]
pub struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Only print errors and the final summary
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // A missing .env is fine; real environment variables take precedence.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let code = match cli.command {
        Commands::Upload(args) => commands::upload::execute(args, output_config).await,
        Commands::Completions(args) => commands::completions::execute(args),
    };

    if code != ExitCode::Success {
        tracing::debug!(code = code.as_u8(), "Exiting with failure status");
    }
    code.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["wasabi-push", "upload", "--json", "--quiet", "-n"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Upload(ref args) if args.dry_run));
    }
}
