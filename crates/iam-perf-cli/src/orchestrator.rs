//! Seed and cleanup runs.
//!
//! Each run walks a fixed sequence of states. A step only starts once the
//! previous one succeeded; the first failure aborts the run with the failed
//! [`Step`] attached. Nothing is rolled back, since every step is safe to
//! repeat.

use std::fmt;
use std::path::PathBuf;

use iam_perf_provider::{build_provider, AdminToken, IamProvider, UserBatch};

use crate::artifact::FixtureBundle;
use crate::config::CliConfig;
use crate::fixture::{load_clients_fixture, ClientFixture};
use crate::{CliError, CliResult};

/// A unit of work in a run, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Reading configuration and fixture files.
    Configure,
    /// Admin login.
    Authenticate,
    /// Realm creation.
    EnsureRealm,
    /// Confidential, public and fixture clients.
    EnsureClients,
    /// Bulk user creation.
    CreateUsers,
    /// Artifact write.
    WriteConfig,
    /// Realm deletion.
    DeleteRealm,
    /// Test-user login.
    Verify,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configure => "configure",
            Self::Authenticate => "authenticate",
            Self::EnsureRealm => "ensure realm",
            Self::EnsureClients => "ensure clients",
            Self::CreateUsers => "create users",
            Self::WriteConfig => "write config",
            Self::DeleteRealm => "delete realm",
            Self::Verify => "verify",
        };
        f.write_str(name)
    }
}

/// Progress of a seed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeedState {
    /// Nothing done yet.
    Init,
    /// Admin token acquired.
    Authenticated,
    /// Realm exists.
    RealmReady,
    /// Clients exist and the confidential secret is known.
    ClientsReady,
    /// Users created; a test user is known.
    UsersReady,
    /// Artifact written.
    ConfigWritten,
}

/// Progress of a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CleanupState {
    /// Nothing done yet.
    Init,
    /// Admin token acquired.
    Authenticated,
    /// Realm gone.
    RealmDeleted,
}

/// State shared by the steps of one run.
pub struct RunContext {
    /// Configuration for this run.
    pub config: CliConfig,
    provider: Box<dyn IamProvider>,
    token: Option<AdminToken>,
}

impl RunContext {
    /// Selects the provider adapter for `config`.
    pub fn new(config: CliConfig) -> CliResult<Self> {
        let provider = build_provider(config.provider.clone())?;
        Ok(Self {
            config,
            provider,
            token: None,
        })
    }

    /// The selected provider.
    #[must_use]
    pub fn provider(&self) -> &dyn IamProvider {
        self.provider.as_ref()
    }

    /// Acquires the admin token, once per run.
    async fn authenticate(&mut self) -> CliResult<AdminToken> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let credentials = self.provider.admin_credentials()?;
        let token = self.provider.authenticate(&credentials).await?;
        self.token = Some(token.clone());
        Ok(token)
    }
}

/// Result of a successful seed run.
#[derive(Debug)]
pub struct SeedOutcome {
    /// What was written to the artifact.
    pub bundle: FixtureBundle,
    /// Per-user results.
    pub users: UserBatch,
    /// Where the artifact was written.
    pub artifact_path: PathBuf,
}

/// A seed run.
pub struct SeedRun {
    ctx: RunContext,
    clients: Vec<ClientFixture>,
    state: SeedState,
}

impl SeedRun {
    /// Prepares a seed run. Fails before any network call on bad configuration.
    pub fn new(config: CliConfig) -> CliResult<Self> {
        let clients = match &config.clients_fixture {
            Some(path) => load_clients_fixture(path).map_err(|e| CliError::at(Step::Configure, e))?,
            None => Vec::new(),
        };
        let ctx = RunContext::new(config).map_err(|e| CliError::at(Step::Configure, e))?;

        Ok(Self {
            ctx,
            clients,
            state: SeedState::Init,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SeedState {
        self.state
    }

    /// Run context.
    #[must_use]
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    fn advance(&mut self, next: SeedState) {
        tracing::info!(from = ?self.state, to = ?next, "seed state transition");
        self.state = next;
    }

    /// Runs every seed step and writes the artifact.
    pub async fn run(&mut self) -> CliResult<SeedOutcome> {
        let token = self
            .ctx
            .authenticate()
            .await
            .map_err(|e| CliError::at(Step::Authenticate, e))?;
        self.advance(SeedState::Authenticated);

        let config = self.ctx.config.clone();
        let settings = &config.provider;
        let provider = self.ctx.provider();

        let realm = provider
            .ensure_realm(&token, &settings.perf_realm)
            .await
            .map_err(|e| CliError::at(Step::EnsureRealm, e))?;
        self.advance(SeedState::RealmReady);

        let provider = self.ctx.provider();
        let confidential = provider
            .ensure_confidential_client(&token, &realm, settings.client_id.as_deref())
            .await
            .map_err(|e| CliError::at(Step::EnsureClients, e))?;
        let public_client_id = provider
            .ensure_public_client(&token, &realm, &settings.public_client_id)
            .await
            .map_err(|e| CliError::at(Step::EnsureClients, e))?;

        let mut extra_clients = Vec::with_capacity(self.clients.len());
        for fixture in &self.clients {
            provider
                .ensure_client(&token, &realm, &fixture.to_spec())
                .await
                .map_err(|e| CliError::at(Step::EnsureClients, e))?;
            extra_clients.push(fixture.client_id.clone());
        }
        self.advance(SeedState::ClientsReady);

        let provider = self.ctx.provider();
        let users = provider
            .create_users(
                &token,
                &realm,
                settings.user_count,
                &settings.user_password,
                &settings.naming,
            )
            .await;
        if !users.is_complete() {
            tracing::warn!(
                created = users.created.len(),
                failed = users.failures.len(),
                "some users could not be created"
            );
        }
        let test_username = if settings.user_count == 0 {
            String::new()
        } else {
            users
                .first_usable_username()
                .map(str::to_string)
                .ok_or_else(|| {
                    CliError::at(
                        Step::CreateUsers,
                        CliError::NoTestUser {
                            requested: users.requested(),
                            failed: users.failures.len(),
                        },
                    )
                })?
        };
        self.advance(SeedState::UsersReady);

        let bundle = FixtureBundle {
            provider: settings.kind,
            base_url: settings.base_url.clone(),
            realm: realm.name,
            client_id: confidential.client_id,
            client_secret: confidential.client_secret,
            public_client_id,
            extra_clients,
            usernames: users.created.clone(),
            test_username,
            test_password: settings.user_password.clone(),
            user_count: settings.user_count,
            vus: config.vus,
            duration: config.duration.clone(),
        };
        bundle
            .write_to(&config.output_path)
            .map_err(|e| CliError::at(Step::WriteConfig, e))?;
        self.advance(SeedState::ConfigWritten);

        Ok(SeedOutcome {
            bundle,
            users,
            artifact_path: config.output_path,
        })
    }
}

/// A cleanup run.
pub struct CleanupRun {
    ctx: RunContext,
    state: CleanupState,
}

impl CleanupRun {
    /// Prepares a cleanup run.
    pub fn new(config: CliConfig) -> CliResult<Self> {
        let ctx = RunContext::new(config).map_err(|e| CliError::at(Step::Configure, e))?;
        Ok(Self {
            ctx,
            state: CleanupState::Init,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CleanupState {
        self.state
    }

    /// Run context.
    #[must_use]
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    fn advance(&mut self, next: CleanupState) {
        tracing::info!(from = ?self.state, to = ?next, "cleanup state transition");
        self.state = next;
    }

    /// Deletes the performance realm.
    pub async fn run(&mut self) -> CliResult<()> {
        let token = self
            .ctx
            .authenticate()
            .await
            .map_err(|e| CliError::at(Step::Authenticate, e))?;
        self.advance(CleanupState::Authenticated);

        let realm = self.ctx.config.provider.perf_realm.clone();
        self.ctx
            .provider()
            .cleanup_realm(&token, &realm)
            .await
            .map_err(|e| CliError::at(Step::DeleteRealm, e))?;
        self.advance(CleanupState::RealmDeleted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> CliConfig {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        CliConfig::from_lookup(|key: &str| map.get(key).map(|v| (*v).to_string())).unwrap()
    }

    #[test]
    fn step_names() {
        assert_eq!(Step::EnsureRealm.to_string(), "ensure realm");
        assert_eq!(Step::CreateUsers.to_string(), "create users");
        assert_eq!(Step::DeleteRealm.to_string(), "delete realm");
    }

    #[test]
    fn states_are_ordered() {
        assert!(SeedState::Init < SeedState::Authenticated);
        assert!(SeedState::UsersReady < SeedState::ConfigWritten);
        assert!(CleanupState::Authenticated < CleanupState::RealmDeleted);
    }

    #[test]
    fn new_run_starts_in_init() {
        let run = SeedRun::new(config(&[("IAM_PROVIDER", "keycloak")])).unwrap();
        assert_eq!(run.state(), SeedState::Init);
        assert_eq!(run.context().provider().name(), "Keycloak");
    }

    #[test]
    fn unparseable_fixture_fails_at_configure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.json");
        std::fs::write(&path, "{not json").unwrap();
        let path = path.to_string_lossy().to_string();

        let err = SeedRun::new(config(&[("CLIENTS_FIXTURE", path.as_str())]))
            .err()
            .unwrap();
        assert_eq!(err.step(), Some(Step::Configure));
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn ferriskey_without_admin_client_fails_at_authenticate() {
        let mut run = SeedRun::new(config(&[
            ("IAM_PROVIDER", "ferriskey"),
            ("BASE_URL", "http://127.0.0.1:1"),
        ]))
        .unwrap();

        let err = run.run().await.unwrap_err();
        assert_eq!(err.step(), Some(Step::Authenticate));
        assert!(err.is_config());
        assert_eq!(run.state(), SeedState::Init);
    }
}
