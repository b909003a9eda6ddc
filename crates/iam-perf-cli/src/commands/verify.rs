//! Test-user login check.

use std::path::Path;
use std::time::Duration;

use iam_perf_provider::http::HttpClient;
use iam_perf_provider::token::{password_grant, GrantClient};

use crate::artifact::{read_artifact, ArtifactLogin};
use crate::cli::VerifyArgs;
use crate::orchestrator::Step;
use crate::output::success;
use crate::{CliConfig, CliError, CliResult};

/// Runs the verify command against an existing artifact.
pub async fn run_verify(args: VerifyArgs, config: &CliConfig) -> crate::CliResult<()> {
    let path = args.artifact.as_deref().unwrap_or(config.output_path.as_path());
    verify_artifact(path, config.provider.request_timeout).await
}

/// Reads `path` and logs in as its test user.
pub async fn verify_artifact(path: &Path, timeout: Duration) -> CliResult<()> {
    let login = read_artifact(path).map_err(|e| CliError::at(Step::Verify, e))?;
    verify_login(&login, timeout)
        .await
        .map_err(|e| CliError::at(Step::Verify, e))?;
    success(&format!(
        "User '{}' logged in to realm '{}' through client '{}'",
        login.username, login.realm, login.client_id
    ));
    Ok(())
}

/// Performs a password grant as the test user with the seeded client.
///
/// Succeeds only when the server answers 200 with an access token.
pub async fn verify_login(login: &ArtifactLogin, timeout: Duration) -> CliResult<()> {
    let http = HttpClient::new(&login.base_url, timeout)?;
    let client = GrantClient {
        client_id: &login.client_id,
        client_secret: Some(&login.client_secret),
    };
    let (_, token) = password_grant(
        &http,
        &login.realm,
        client,
        &login.username,
        &login.password,
    )
    .await?;

    tracing::info!(
        username = %login.username,
        expires_in = ?token.expires_in,
        "test user login succeeded"
    );
    Ok(())
}
