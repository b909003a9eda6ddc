//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Log filter installed by `--verbose`: debug output from both workspace crates.
pub const VERBOSE_LOG_FILTER: &str = "warn,iam_perf_cli=debug,iam_perf_provider=debug";

/// iam-perf - Fixture seeding for IAM performance tests.
#[derive(Debug, Parser)]
#[command(name = "iam-perf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Environment file to load before reading configuration.
    #[arg(short, long, global = true, env = "IAM_PERF_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the realm, clients and users, then write the artifact.
    Seed(SeedArgs),

    /// Delete the performance realm.
    Cleanup(CleanupArgs),

    /// Log in as the test user recorded in an artifact.
    Verify(VerifyArgs),
}

/// Seed arguments.
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Artifact path (overrides OUTPUT_ENV_FILE).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of users to create (overrides USER_COUNT).
    #[arg(short = 'n', long)]
    pub user_count: Option<usize>,

    /// Log in as the test user after seeding.
    #[arg(long)]
    pub verify: bool,
}

/// Cleanup arguments.
#[derive(Debug, Args)]
pub struct CleanupArgs {
    /// Skip confirmation.
    #[arg(short, long)]
    pub force: bool,
}

/// Verify arguments.
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Artifact to verify (defaults to OUTPUT_ENV_FILE).
    #[arg(short, long)]
    pub artifact: Option<PathBuf>,
}
