//! # iam-perf
//!
//! Seeds and cleans up IAM fixtures for performance tests.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![allow(clippy::uninlined_format_args)]

use clap::Parser;
use iam_perf_cli::{
    cli::{Cli, Command, VERBOSE_LOG_FILTER},
    commands::{run_cleanup, run_seed, run_verify},
    config::CliConfig,
    output::error,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match CliConfig::load(cli.env_file.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Command::Seed(args) => run_seed(args, config).await,
        Command::Cleanup(args) => run_cleanup(args, config).await,
        Command::Verify(args) => run_verify(args, &config).await,
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}
