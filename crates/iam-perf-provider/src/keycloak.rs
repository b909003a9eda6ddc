//! Keycloak adapter.
//!
//! Admin operations live under `/admin/realms`. Admin login goes through
//! the well-known `admin-cli` client (configurable). Created resources are
//! identified by the `Location` header, and "already exists" is HTTP 409.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpClient;
use crate::provider::{
    AdminCredentials, AdminToken, ClientSpec, IamProvider, RealmRef, UserSpec,
};
use crate::token::{password_grant, GrantClient};

/// Create realm request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealmRepresentation<'a> {
    realm: &'a str,
    enabled: bool,
    display_name: String,
}

/// Create client request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientRepresentation<'a> {
    client_id: &'a str,
    name: &'a str,
    enabled: bool,
    protocol: &'a str,
    public_client: bool,
    service_accounts_enabled: bool,
    direct_access_grants_enabled: bool,
    standard_flow_enabled: bool,
}

impl<'a> From<&'a ClientSpec> for ClientRepresentation<'a> {
    fn from(spec: &'a ClientSpec) -> Self {
        Self {
            client_id: &spec.client_id,
            name: &spec.name,
            enabled: spec.enabled,
            protocol: &spec.protocol,
            public_client: spec.public_client,
            service_accounts_enabled: spec.service_accounts_enabled,
            direct_access_grants_enabled: spec.direct_access_grants_enabled,
            standard_flow_enabled: spec.standard_flow_enabled,
        }
    }
}

/// Client as returned by the clients listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientSummary {
    id: String,
    client_id: String,
}

/// Client secret response.
#[derive(Debug, Deserialize)]
struct ClientSecretResponse {
    #[serde(default)]
    value: Option<String>,
}

/// Create user request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRepresentation<'a> {
    username: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    email_verified: bool,
    enabled: bool,
}

/// User as returned by the users search.
#[derive(Debug, Deserialize)]
struct UserSummary {
    id: String,
    username: String,
}

/// Password reset request.
#[derive(Debug, Serialize)]
struct CredentialRepresentation<'a> {
    #[serde(rename = "type")]
    type_: &'a str,
    value: &'a str,
    temporary: bool,
}

/// Keycloak implementation of [`IamProvider`].
pub struct KeycloakProvider {
    config: ProviderConfig,
    http: HttpClient,
}

impl KeycloakProvider {
    /// Creates a Keycloak adapter.
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = HttpClient::new(&config.base_url, config.request_timeout)?;
        Ok(Self { config, http })
    }

    fn realm_path(realm: &str) -> String {
        format!("/admin/realms/{}", encode(realm))
    }

    /// Finds a client by client_id and returns its internal UUID.
    async fn find_client_uuid(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        client_id: &str,
    ) -> ProviderResult<Option<String>> {
        let operation = format!("look up client '{client_id}'");
        let path = format!(
            "{}/clients?clientId={}",
            Self::realm_path(&realm.name),
            encode(client_id)
        );
        let response = self
            .http
            .get(&operation, &path, token)
            .await?
            .ensure_success(&operation)?;
        let clients: Vec<ClientSummary> = response.json(&operation)?;

        Ok(clients
            .into_iter()
            .find(|c| c.client_id == client_id)
            .map(|c| c.id))
    }

    async fn fetch_secret(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        uuid: &str,
        regenerate: bool,
    ) -> ProviderResult<Option<String>> {
        let operation = if regenerate {
            format!("generate secret for client {uuid}")
        } else {
            format!("read secret of client {uuid}")
        };
        let path = format!(
            "{}/clients/{}/client-secret",
            Self::realm_path(&realm.name),
            encode(uuid)
        );
        let response = if regenerate {
            self.http.post_empty(&operation, &path, token).await?
        } else {
            self.http.get(&operation, &path, token).await?
        };
        let secret: ClientSecretResponse = response.ensure_success(&operation)?.json(&operation)?;
        Ok(secret.value.filter(|v| !v.is_empty()))
    }

    async fn find_user_id(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        username: &str,
    ) -> ProviderResult<Option<String>> {
        let operation = format!("look up user '{username}'");
        let path = format!(
            "{}/users?username={}&exact=true",
            Self::realm_path(&realm.name),
            encode(username)
        );
        let users: Vec<UserSummary> = self
            .http
            .get(&operation, &path, token)
            .await?
            .ensure_success(&operation)?
            .json(&operation)?;
        Ok(users
            .into_iter()
            .find(|u| u.username == username)
            .map(|u| u.id))
    }

    /// Sets a non-temporary password.
    async fn reset_password(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        user_id: &str,
        user: &UserSpec,
    ) -> ProviderResult<()> {
        let operation = format!("set password of '{}'", user.username);
        let path = format!(
            "{}/users/{}/reset-password",
            Self::realm_path(&realm.name),
            encode(user_id)
        );
        let credential = CredentialRepresentation {
            type_: "password",
            value: &user.password,
            temporary: false,
        };
        self.http
            .put_json(&operation, &path, token, &credential)
            .await?
            .ensure_success(&operation)?;
        Ok(())
    }
}

#[async_trait]
impl IamProvider for KeycloakProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn admin_credentials(&self) -> ProviderResult<AdminCredentials> {
        Ok(AdminCredentials {
            realm: self.config.admin_realm.clone(),
            username: self.config.admin_username.clone(),
            password: self.config.admin_password.clone(),
            client_id: self.config.keycloak_auth_client.clone(),
            client_secret: None,
        })
    }

    async fn authenticate(&self, credentials: &AdminCredentials) -> ProviderResult<AdminToken> {
        let client = GrantClient {
            client_id: &credentials.client_id,
            client_secret: credentials.client_secret.as_deref(),
        };
        let (access_token, _) = password_grant(
            &self.http,
            &credentials.realm,
            client,
            &credentials.username,
            &credentials.password,
        )
        .await?;
        tracing::info!(realm = %credentials.realm, "admin authentication successful");
        Ok(AdminToken::new(access_token))
    }

    async fn ensure_realm(&self, token: &AdminToken, name: &str) -> ProviderResult<RealmRef> {
        let operation = format!("create realm '{name}'");
        let request = RealmRepresentation {
            realm: name,
            enabled: true,
            display_name: format!("{name} Performance Testing"),
        };
        let response = self
            .http
            .post_json(&operation, "/admin/realms", token, &request)
            .await?;

        match response.status {
            200..=299 => tracing::info!(realm = name, "realm created"),
            409 => tracing::warn!(realm = name, "realm already exists"),
            _ => return Err(response.into_error(&operation)),
        }
        Ok(RealmRef::new(name))
    }

    async fn ensure_client(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        spec: &ClientSpec,
    ) -> ProviderResult<String> {
        let operation = format!("create client '{}'", spec.client_id);
        let path = format!("{}/clients", Self::realm_path(&realm.name));
        let request = ClientRepresentation::from(spec);
        let response = self.http.post_json(&operation, &path, token, &request).await?;

        if response.is_success() {
            tracing::info!(client_id = %spec.client_id, "client created");
            if let Some(id) = response.location_id() {
                return Ok(id);
            }
        } else if response.status == 409 {
            tracing::warn!(client_id = %spec.client_id, "client already exists");
        } else {
            return Err(response.into_error(&operation));
        }

        self.find_client_uuid(token, realm, &spec.client_id)
            .await?
            .ok_or_else(|| {
                ProviderError::provision(
                    &operation,
                    404,
                    format!("client '{}' not found after creation", spec.client_id),
                )
            })
    }

    async fn client_secret(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        id: &str,
        client_id: &str,
    ) -> ProviderResult<String> {
        if let Some(secret) = self.fetch_secret(token, realm, id, false).await? {
            return Ok(secret);
        }
        tracing::warn!(%client_id, "no secret stored, generating a new one");
        self.fetch_secret(token, realm, id, true)
            .await?
            .ok_or_else(|| {
                ProviderError::provision(
                    format!("retrieve secret of client '{client_id}'"),
                    200,
                    "server returned no secret",
                )
            })
    }

    async fn create_user(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        user: &UserSpec,
    ) -> ProviderResult<String> {
        let operation = format!("create user '{}'", user.username);
        let request = UserRepresentation {
            username: &user.username,
            first_name: &user.first_name,
            last_name: &user.last_name,
            email: &user.email,
            email_verified: true,
            enabled: true,
        };
        let path = format!("{}/users", Self::realm_path(&realm.name));
        let response = self.http.post_json(&operation, &path, token, &request).await?;

        if response.status == 409 {
            let user_id = self
                .find_user_id(token, realm, &user.username)
                .await?
                .ok_or_else(|| {
                    ProviderError::provision(&operation, 404, "existing user not found")
                })?;
            self.reset_password(token, realm, &user_id, user).await?;
            tracing::debug!(username = %user.username, "existing user password reset");
            return Err(ProviderError::conflict(&operation, response.status, response.body));
        }
        let response = response.ensure_success(&operation)?;

        let user_id = match response.location_id() {
            Some(id) => id,
            None => self
                .find_user_id(token, realm, &user.username)
                .await?
                .ok_or_else(|| {
                    ProviderError::provision(&operation, response.status, "created user not found")
                })?,
        };

        self.reset_password(token, realm, &user_id, user).await?;
        Ok(user_id)
    }

    async fn cleanup_realm(&self, token: &AdminToken, realm: &str) -> ProviderResult<()> {
        let operation = format!("delete realm '{realm}'");
        let response = self
            .http
            .delete(&operation, &Self::realm_path(realm), token)
            .await?;

        match response.status {
            200..=299 => tracing::info!(realm, "realm deleted"),
            404 => tracing::warn!(realm, "realm not found, nothing to delete"),
            _ => return Err(response.into_error(&operation)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_representation_is_camel_case() {
        let spec = ClientSpec::confidential("perf-client");
        let json = serde_json::to_value(ClientRepresentation::from(&spec)).unwrap();
        assert_eq!(json["clientId"], "perf-client");
        assert_eq!(json["name"], "Performance Test Client");
        assert_eq!(json["serviceAccountsEnabled"], true);
        assert_eq!(json["publicClient"], false);
    }

    #[test]
    fn credential_uses_type_key() {
        let credential = CredentialRepresentation {
            type_: "password",
            value: "perf-password",
            temporary: false,
        };
        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(json["type"], "password");
        assert_eq!(json["temporary"], false);
    }

    #[test]
    fn realm_path_is_encoded() {
        assert_eq!(KeycloakProvider::realm_path("perf"), "/admin/realms/perf");
        assert_eq!(KeycloakProvider::realm_path("a/b"), "/admin/realms/a%2Fb");
    }
}
