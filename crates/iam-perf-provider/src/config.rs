//! Provider configuration.
//!
//! Configuration is read from environment variables with per-backend
//! defaults. Loading goes through a lookup function so the same code path
//! serves `std::env` and in-memory maps.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::UserSpec;

/// Supported IAM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Keycloak (admin API under `/admin/realms`).
    Keycloak,
    /// FerrisKey (admin API under `/realms`).
    FerrisKey,
}

impl ProviderKind {
    /// Value used for `IAM_PROVIDER`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keycloak => "keycloak",
            Self::FerrisKey => "ferriskey",
        }
    }

    /// Human-readable backend name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Keycloak => "Keycloak",
            Self::FerrisKey => "FerrisKey",
        }
    }

    /// Default server URL for this backend.
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Keycloak => "http://localhost:8080",
            Self::FerrisKey => "http://localhost:3333",
        }
    }

    /// Default realm used for performance fixtures.
    #[must_use]
    pub const fn default_perf_realm(self) -> &'static str {
        match self {
            Self::Keycloak => "perf",
            Self::FerrisKey => "perf-realm",
        }
    }

    /// Default realm holding the administrator account.
    #[must_use]
    pub const fn default_admin_realm(self) -> &'static str {
        "master"
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keycloak" => Ok(Self::Keycloak),
            "ferriskey" => Ok(Self::FerrisKey),
            other => Err(ProviderError::Config(format!(
                "unknown IAM_PROVIDER '{other}'. Supported: keycloak, ferriskey"
            ))),
        }
    }
}

/// Deterministic naming for seeded users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNaming {
    /// Username prefix, e.g. `perf-user-`.
    pub prefix: String,
    /// First name given to every user.
    pub first_name: String,
    /// Prefix of the last name; the padded index is appended.
    pub last_name_prefix: String,
    /// Local-part prefix of the email; the padded index is appended.
    pub email_prefix: String,
    /// Email domain.
    pub email_domain: String,
}

impl Default for UserNaming {
    fn default() -> Self {
        Self {
            prefix: "perf-user-".to_string(),
            first_name: "Perf".to_string(),
            last_name_prefix: "User".to_string(),
            email_prefix: "perf".to_string(),
            email_domain: "test.local".to_string(),
        }
    }
}

impl UserNaming {
    /// Username for a 1-based index, zero-padded to three digits.
    #[must_use]
    pub fn username(&self, index: usize) -> String {
        format!("{}{index:03}", self.prefix)
    }

    /// Full user definition for a 1-based index.
    #[must_use]
    pub fn user(&self, index: usize, password: &str) -> UserSpec {
        UserSpec {
            username: self.username(index),
            password: password.to_string(),
            first_name: self.first_name.clone(),
            last_name: format!("{}{index:03}", self.last_name_prefix),
            email: format!("{}{index:03}@{}", self.email_prefix, self.email_domain),
        }
    }
}

/// Configuration shared by all providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Selected backend.
    pub kind: ProviderKind,
    /// Server URL without trailing slash.
    pub base_url: String,
    /// Per-request network timeout.
    pub request_timeout: Duration,
    /// Administrator username.
    pub admin_username: String,
    /// Administrator password.
    pub admin_password: String,
    /// Realm holding the administrator account.
    pub admin_realm: String,
    /// Service-account client used for admin login (FerrisKey).
    pub admin_client_id: Option<String>,
    /// Secret of the admin client, if it is confidential.
    pub admin_client_secret: Option<String>,
    /// Well-known admin client (Keycloak).
    pub keycloak_auth_client: String,
    /// Realm receiving the fixtures.
    pub perf_realm: String,
    /// Confidential client id. `None` mints a random id per run.
    pub client_id: Option<String>,
    /// Public client id.
    pub public_client_id: String,
    /// Number of users to create.
    pub user_count: usize,
    /// Password given to every user.
    pub user_password: String,
    /// User naming pattern.
    pub naming: UserNaming,
    /// Maximum number of in-flight user creations.
    pub user_create_concurrency: usize,
}

impl ProviderConfig {
    /// Loads configuration through `lookup`.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> ProviderResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let kind: ProviderKind = get("IAM_PROVIDER")
            .as_deref()
            .unwrap_or("ferriskey")
            .parse()?;

        let base_url = get("BASE_URL")
            .unwrap_or_else(|| kind.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let request_timeout = Duration::from_secs(parse_number(&get, "REQUEST_TIMEOUT", 30)?);
        let user_count: usize = parse_number(&get, "USER_COUNT", 50)?;
        let user_create_concurrency: usize = parse_number(&get, "USER_CREATE_CONCURRENCY", 4)?;
        if user_create_concurrency == 0 {
            return Err(ProviderError::Config(
                "USER_CREATE_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let defaults = UserNaming::default();
        let naming = UserNaming {
            prefix: get("USER_PREFIX").unwrap_or(defaults.prefix),
            first_name: get("USER_FIRSTNAME").unwrap_or(defaults.first_name),
            last_name_prefix: get("USER_LASTNAME_PREFIX").unwrap_or(defaults.last_name_prefix),
            email_prefix: get("USER_EMAIL_PREFIX").unwrap_or(defaults.email_prefix),
            email_domain: get("USER_EMAIL_DOMAIN").unwrap_or(defaults.email_domain),
        };

        Ok(Self {
            kind,
            base_url,
            request_timeout,
            admin_username: get("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            admin_password: get("ADMIN_PASSWORD").unwrap_or_else(|| "admin".to_string()),
            admin_realm: get("ADMIN_REALM")
                .unwrap_or_else(|| kind.default_admin_realm().to_string()),
            admin_client_id: get("ADMIN_CLIENT_ID"),
            admin_client_secret: get("ADMIN_CLIENT_SECRET"),
            keycloak_auth_client: get("KEYCLOAK_AUTH_CLIENT")
                .unwrap_or_else(|| "admin-cli".to_string()),
            perf_realm: get("PERF_REALM").unwrap_or_else(|| kind.default_perf_realm().to_string()),
            client_id: get("CLIENT_ID"),
            public_client_id: get("PUBLIC_CLIENT_ID")
                .unwrap_or_else(|| "perf-public-client".to_string()),
            user_count,
            user_password: get("USER_PASSWORD").unwrap_or_else(|| "perf-password".to_string()),
            naming,
            user_create_concurrency,
        })
    }
}

fn parse_number<G, T>(get: &G, key: &str, default: T) -> ProviderResult<T>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ProviderError::Config(format!("{key} must be a number, got '{raw}'"))),
    }
}
