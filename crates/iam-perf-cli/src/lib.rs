//! # iam-perf-cli
//!
//! Fixture lifecycle for IAM performance tests.
//!
//! This crate provides:
//! - `seed`: authenticate, ensure realm and clients, create users, write the
//!   generated environment artifact consumed by the load scenarios
//! - `cleanup`: delete the performance realm (idempotent)
//! - `verify`: request a token as the seeded test user

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

pub mod artifact;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fixture;
pub mod orchestrator;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
