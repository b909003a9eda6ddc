//! CLI configuration.
//!
//! Values come from the environment, optionally pre-loaded from a `.env`
//! style file. Provider settings are delegated to [`ProviderConfig`].

use std::path::{Path, PathBuf};

use iam_perf_provider::ProviderConfig;

use crate::{CliError, CliResult};

/// Default path of the generated environment artifact.
pub const DEFAULT_OUTPUT_ENV_FILE: &str = ".env.perf";

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Provider settings (backend, server, admin credentials, fixtures).
    pub provider: ProviderConfig,

    /// Where the generated environment artifact is written.
    pub output_path: PathBuf,

    /// Optional JSON file listing extra clients to ensure.
    pub clients_fixture: Option<PathBuf>,

    /// Default virtual-user count written for the load scenarios.
    pub vus: u32,

    /// Default scenario duration written for the load scenarios.
    pub duration: String,
}

impl CliConfig {
    /// Loads configuration from the environment.
    ///
    /// `env_file` must exist when given; otherwise a `.env` in the working
    /// directory is loaded if present.
    pub fn load(env_file: Option<&Path>) -> CliResult<Self> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    CliError::Config(format!("failed to load {}: {e}", path.display()))
                })?;
            }
            None => {
                let _ = dotenvy::dotenv();
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = ProviderConfig::from_lookup(&lookup)?;

        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let vus = match get("VUS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| CliError::Config(format!("VUS must be a number, got '{raw}'")))?,
            None => 10,
        };

        Ok(Self {
            provider,
            output_path: get("OUTPUT_ENV_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ENV_FILE), PathBuf::from),
            clients_fixture: get("CLIENTS_FIXTURE").map(PathBuf::from),
            vus,
            duration: get("DURATION").unwrap_or_else(|| "30s".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_perf_provider::ProviderKind;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> CliResult<CliConfig> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        CliConfig::from_lookup(|key: &str| map.get(key).map(|v| (*v).to_string()))
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.output_path, PathBuf::from(".env.perf"));
        assert_eq!(config.vus, 10);
        assert_eq!(config.duration, "30s");
        assert!(config.clients_fixture.is_none());
        assert_eq!(config.provider.kind, ProviderKind::FerrisKey);
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("IAM_PROVIDER", "keycloak"),
            ("OUTPUT_ENV_FILE", "k6/.env.generated"),
            ("VUS", "50"),
            ("DURATION", "2m"),
            ("CLIENTS_FIXTURE", "data/clients.json"),
        ])
        .unwrap();
        assert_eq!(config.output_path, PathBuf::from("k6/.env.generated"));
        assert_eq!(config.vus, 50);
        assert_eq!(config.duration, "2m");
        assert_eq!(config.clients_fixture, Some(PathBuf::from("data/clients.json")));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(load(&[("VUS", "lots")]).unwrap_err().is_config());
        assert!(load(&[("IAM_PROVIDER", "auth0")]).unwrap_err().is_config());
    }
}
