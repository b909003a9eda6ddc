//! # iam-perf-provider
//!
//! Backend-agnostic fixture provisioning for IAM performance tests.
//!
//! This crate provides:
//! - The [`IamProvider`] capability trait (authenticate, ensure realm,
//!   ensure clients, create users, cleanup)
//! - Adapters for Keycloak and FerrisKey
//! - A thin HTTP wrapper that classifies failures into [`ProviderError`]
//! - Configuration loading from environment-style lookups

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod error;
pub mod ferriskey;
pub mod http;
pub mod keycloak;
pub mod provider;
pub mod random;
pub mod token;

pub use config::{ProviderConfig, ProviderKind, UserNaming};
pub use error::{ProviderError, ProviderResult};
pub use ferriskey::FerrisKeyProvider;
pub use keycloak::KeycloakProvider;
pub use provider::{
    build_provider, AdminCredentials, AdminToken, ClientCredentials, ClientSpec, IamProvider,
    RealmRef, UserBatch, UserFailure, UserSpec,
};
