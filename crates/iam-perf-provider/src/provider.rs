//! IAM provider trait.
//!
//! An [`IamProvider`] prepares performance fixtures against one backend.
//! Every operation is idempotent except user creation, which reports
//! per-user failures in a [`UserBatch`] instead of aborting.

use std::fmt;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::config::{ProviderConfig, ProviderKind, UserNaming};
use crate::error::ProviderResult;
use crate::ferriskey::FerrisKeyProvider;
use crate::keycloak::KeycloakProvider;
use crate::random::generate_client_id;

/// Display name given to the confidential performance client.
pub const CONFIDENTIAL_CLIENT_NAME: &str = "Performance Test Client";

/// Display name given to the public performance client.
pub const PUBLIC_CLIENT_NAME: &str = "Performance Test Public Client";

/// Admin access token, acquired once per run and shared read-only.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminToken(String);

impl AdminToken {
    /// Wraps a raw access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken(***)")
    }
}

/// Credentials used for the admin password grant.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    /// Realm holding the administrator account.
    pub realm: String,
    /// Administrator username.
    pub username: String,
    /// Administrator password.
    pub password: String,
    /// Client the grant is requested through.
    pub client_id: String,
    /// Client secret, for confidential admin clients.
    pub client_secret: Option<String>,
}

/// Reference to a realm known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealmRef {
    /// Realm name.
    pub name: String,
}

impl RealmRef {
    /// Creates a realm reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Confidential client identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// OAuth2 client id.
    pub client_id: String,
    /// Client secret issued or stored by the server.
    pub client_secret: String,
}

/// A client to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSpec {
    /// OAuth2 client id.
    pub client_id: String,
    /// Display name.
    pub name: String,
    /// Whether the client is enabled.
    pub enabled: bool,
    /// Protocol, normally `openid-connect`.
    pub protocol: String,
    /// Public clients have no secret.
    pub public_client: bool,
    /// Client credentials grant.
    pub service_accounts_enabled: bool,
    /// Resource owner password grant.
    pub direct_access_grants_enabled: bool,
    /// Authorization code flow.
    pub standard_flow_enabled: bool,
}

impl ClientSpec {
    /// Confidential performance client with service accounts and password grant.
    pub fn confidential(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            name: CONFIDENTIAL_CLIENT_NAME.to_string(),
            enabled: true,
            protocol: "openid-connect".to_string(),
            public_client: false,
            service_accounts_enabled: true,
            direct_access_grants_enabled: true,
            standard_flow_enabled: true,
        }
    }

    /// Public performance client with password grant.
    pub fn public(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            name: PUBLIC_CLIENT_NAME.to_string(),
            enabled: true,
            protocol: "openid-connect".to_string(),
            public_client: true,
            service_accounts_enabled: false,
            direct_access_grants_enabled: true,
            standard_flow_enabled: true,
        }
    }
}

/// A user to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    /// Username.
    pub username: String,
    /// Non-temporary password.
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address, marked as verified.
    pub email: String,
}

/// One failed user creation.
#[derive(Debug)]
pub struct UserFailure {
    /// 1-based user index.
    pub index: usize,
    /// Username that failed.
    pub username: String,
    /// Why it failed.
    pub error: crate::ProviderError,
}

/// Outcome of a bulk user creation.
#[derive(Debug, Default)]
pub struct UserBatch {
    /// Usernames created, in index order.
    pub created: Vec<String>,
    /// Failures, in index order.
    pub failures: Vec<UserFailure>,
}

impl UserBatch {
    /// Number of users requested.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.created.len() + self.failures.len()
    }

    /// True if every requested user was created.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// First user usable for login: a created one, else one that already
    /// existed and whose password was reset by this run.
    #[must_use]
    pub fn first_usable_username(&self) -> Option<&str> {
        self.created.first().map(String::as_str).or_else(|| {
            self.failures
                .iter()
                .find(|f| f.error.is_conflict())
                .map(|f| f.username.as_str())
        })
    }
}

/// Backend-agnostic fixture lifecycle.
///
/// ## Implementation Notes
///
/// - Adapters must not leak backend response shapes; callers only see the
///   types in this module.
/// - "Already exists" is success for realms and clients, and a recorded
///   failure for users. An existing user still gets its password reset, so
///   the conflict only reaches the batch once the password is current.
#[async_trait]
pub trait IamProvider: Send + Sync {
    /// Returns the provider configuration.
    fn config(&self) -> &ProviderConfig;

    /// Returns the backend kind.
    fn kind(&self) -> ProviderKind {
        self.config().kind
    }

    /// Human-readable backend name.
    fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// Resolves the admin credentials from configuration.
    ///
    /// Fails with a configuration error, before any network call, when the
    /// backend needs a value that is missing.
    fn admin_credentials(&self) -> ProviderResult<AdminCredentials>;

    /// Authenticates as administrator. Never retries.
    async fn authenticate(&self, credentials: &AdminCredentials) -> ProviderResult<AdminToken>;

    /// Creates the realm, or accepts an existing one.
    async fn ensure_realm(&self, token: &AdminToken, name: &str) -> ProviderResult<RealmRef>;

    /// Creates a client, or accepts an existing one. Returns the server-side id.
    async fn ensure_client(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        spec: &ClientSpec,
    ) -> ProviderResult<String>;

    /// Reads the secret of a confidential client by server-side id.
    ///
    /// Never returns an empty secret; an unobtainable one is a provision error.
    async fn client_secret(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        id: &str,
        client_id: &str,
    ) -> ProviderResult<String>;

    /// Creates a confidential client, or retrieves the secret of an existing one.
    ///
    /// A `None` client id mints a random `perf-client-` id.
    async fn ensure_confidential_client(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        client_id: Option<&str>,
    ) -> ProviderResult<ClientCredentials> {
        let client_id = client_id.map_or_else(generate_client_id, str::to_string);
        let id = self
            .ensure_client(token, realm, &ClientSpec::confidential(client_id.as_str()))
            .await?;
        let client_secret = self.client_secret(token, realm, &id, &client_id).await?;

        Ok(ClientCredentials {
            client_id,
            client_secret,
        })
    }

    /// Creates a public client, or accepts an existing one.
    async fn ensure_public_client(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        client_id: &str,
    ) -> ProviderResult<String> {
        self.ensure_client(token, realm, &ClientSpec::public(client_id))
            .await?;
        Ok(client_id.to_string())
    }

    /// Creates one user and sets its password. Returns the server-side user id.
    ///
    /// An existing user gets its password reset and is then reported as a
    /// conflict.
    async fn create_user(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        user: &UserSpec,
    ) -> ProviderResult<String>;

    /// Deletes the realm and everything in it. An absent realm is success.
    async fn cleanup_realm(&self, token: &AdminToken, realm: &str) -> ProviderResult<()>;

    /// Creates `count` users named by `naming`.
    ///
    /// Runs up to `user_create_concurrency` creations at a time. Failures
    /// are collected; the batch never aborts.
    async fn create_users(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        count: usize,
        password: &str,
        naming: &UserNaming,
    ) -> UserBatch {
        let concurrency = self.config().user_create_concurrency.max(1);

        let mut outcomes: Vec<(usize, String, ProviderResult<String>)> = stream::iter(1..=count)
            .map(|index| {
                let user = naming.user(index, password);
                async move {
                    let result = self.create_user(token, realm, &user).await;
                    if index % 10 == 0 || index == count {
                        tracing::info!(realm = %realm.name, "creating users... {index}/{count}");
                    }
                    (index, user.username, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut batch = UserBatch::default();
        for (index, username, result) in outcomes {
            match result {
                Ok(_) => batch.created.push(username),
                Err(error) => {
                    tracing::warn!(%username, %error, "user creation failed");
                    batch.failures.push(UserFailure {
                        index,
                        username,
                        error,
                    });
                }
            }
        }
        batch
    }
}

/// Builds the adapter for the configured backend.
pub fn build_provider(config: ProviderConfig) -> ProviderResult<Box<dyn IamProvider>> {
    Ok(match config.kind {
        ProviderKind::Keycloak => Box::new(KeycloakProvider::new(config)?),
        ProviderKind::FerrisKey => Box::new(FerrisKeyProvider::new(config)?),
    })
}
