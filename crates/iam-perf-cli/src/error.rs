//! CLI error types.

use iam_perf_provider::ProviderError;
use thiserror::Error;

use crate::orchestrator::Step;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider error (authentication, provisioning, network, configuration).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A seed or cleanup step failed.
    #[error("step '{step}' failed: {source}")]
    Step {
        /// Step that failed.
        step: Step,
        /// Underlying error.
        #[source]
        source: Box<CliError>,
    },

    /// No user is available for the artifact's test login.
    #[error("no test user available: {failed} of {requested} user creations failed")]
    NoTestUser {
        /// Users requested.
        requested: usize,
        /// Users that failed.
        failed: usize,
    },

    /// Artifact is missing a required key.
    #[error("artifact {path} is missing {key}")]
    MissingArtifactKey {
        /// Artifact path.
        path: String,
        /// Missing key.
        key: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Attributes an error to a step.
    pub fn at(step: Step, err: impl Into<CliError>) -> Self {
        Self::Step {
            step,
            source: Box::new(err.into()),
        }
    }

    /// Returns true for configuration errors, including wrapped ones.
    #[must_use]
    pub fn is_config(&self) -> bool {
        match self {
            Self::Config(_) | Self::Provider(ProviderError::Config(_)) => true,
            Self::Step { source, .. } => source.is_config(),
            _ => false,
        }
    }

    /// Step that failed, if any.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_names_step_and_cause() {
        let err = CliError::at(
            Step::EnsureRealm,
            ProviderError::provision("create realm 'perf'", 403, "forbidden"),
        );
        assert_eq!(
            err.to_string(),
            "step 'ensure realm' failed: create realm 'perf' failed (HTTP 403): forbidden"
        );
        assert_eq!(err.step(), Some(Step::EnsureRealm));
        assert!(!err.is_config());
    }

    #[test]
    fn config_detection_sees_through_steps() {
        let err = CliError::at(
            Step::Authenticate,
            ProviderError::Config("ADMIN_CLIENT_ID is required".to_string()),
        );
        assert!(err.is_config());
        assert!(CliError::Config("bad".to_string()).is_config());
    }
}
