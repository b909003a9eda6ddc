//! FerrisKey adapter.
//!
//! Admin operations live directly under `/realms`. Admin login requires a
//! caller-supplied client (`ADMIN_CLIENT_ID`). Responses wrap resources in
//! a `data` envelope on most endpoints, so id and secret extraction accept
//! both the wrapped and the bare shape.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use urlencoding::encode;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{HttpClient, HttpResponse};
use crate::provider::{
    AdminCredentials, AdminToken, ClientSpec, IamProvider, RealmRef, UserSpec,
};
use crate::token::{password_grant, GrantClient};

#[derive(Debug, Serialize)]
struct CreateRealmRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateClientRequest<'a> {
    name: &'a str,
    client_id: &'a str,
    client_type: &'a str,
    service_account_enabled: bool,
    public_client: bool,
    protocol: &'a str,
    enabled: bool,
    direct_access_grants_enabled: bool,
}

impl<'a> From<&'a ClientSpec> for CreateClientRequest<'a> {
    fn from(spec: &'a ClientSpec) -> Self {
        Self {
            name: &spec.name,
            client_id: &spec.client_id,
            client_type: if spec.public_client {
                "public"
            } else {
                "confidential"
            },
            service_account_enabled: spec.service_accounts_enabled,
            public_client: spec.public_client,
            protocol: &spec.protocol,
            enabled: spec.enabled,
            direct_access_grants_enabled: spec.direct_access_grants_enabled,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateUserRequest<'a> {
    username: &'a str,
    firstname: &'a str,
    lastname: &'a str,
    email: &'a str,
    email_verified: bool,
}

#[derive(Debug, Serialize)]
struct ResetPasswordRequest<'a> {
    temporary: bool,
    credential_type: &'a str,
    value: &'a str,
}

/// True when FerrisKey reports that a resource already exists.
///
/// FerrisKey answers 409, or 400 with an "already exists" message.
fn indicates_existing(response: &HttpResponse) -> bool {
    match response.status {
        409 => true,
        400 => response.body.to_lowercase().contains("exist"),
        _ => false,
    }
}

/// Reads `data.<field>` or `<field>` as a string.
fn string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get("data")
        .and_then(|data| data.get(field))
        .or_else(|| value.get(field))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads a list that may be wrapped in `data`.
fn list_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// FerrisKey implementation of [`IamProvider`].
pub struct FerrisKeyProvider {
    config: ProviderConfig,
    http: HttpClient,
}

impl FerrisKeyProvider {
    /// Creates a FerrisKey adapter.
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = HttpClient::new(&config.base_url, config.request_timeout)?;
        Ok(Self { config, http })
    }

    fn realm_path(realm: &str) -> String {
        format!("/realms/{}", encode(realm))
    }

    /// Finds a client by client_id and returns its server id.
    async fn find_client(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        client_id: &str,
    ) -> ProviderResult<Option<String>> {
        let operation = format!("look up client '{client_id}'");
        let path = format!("{}/clients", Self::realm_path(&realm.name));
        let listing: Value = self
            .http
            .get(&operation, &path, token)
            .await?
            .ensure_success(&operation)?
            .json(&operation)?;

        Ok(list_items(listing)
            .iter()
            .find(|c| c.get("client_id").and_then(Value::as_str) == Some(client_id))
            .and_then(|c| string_field(c, "id")))
    }

    /// Finds a user by username and returns its id.
    async fn find_user_id(
        &self,
        token: &AdminToken,
        realm: &RealmRef,
        username: &str,
    ) -> ProviderResult<Option<String>> {
        let operation = format!("look up user '{username}'");
        let path = format!("{}/users", Self::realm_path(&realm.name));
        let listing: Value = self
            .http
            .get(&operation, &path, token)
            .await?
            .ensure_success(&operation)?
            .json(&operation)?;

        Ok(list_items(listing)
            .iter()
            .find(|u| u.get("username").and_then(Value::as_str) == Some(username))
            .and_then(|u| string_field(u, "id")))
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
        let reset = ResetPasswordRequest {
            temporary: false,
            credential_type: "password",
            value: &user.password,
        };
        self.http
            .put_json(&operation, &path, token, &reset)
            .await?
            .ensure_success(&operation)?;
        Ok(())
    }
}

#[async_trait]
impl IamProvider for FerrisKeyProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn admin_credentials(&self) -> ProviderResult<AdminCredentials> {
        let client_id = self.config.admin_client_id.clone().ok_or_else(|| {
            ProviderError::Config(
                "ADMIN_CLIENT_ID is required for FerrisKey authentication".to_string(),
            )
        })?;
        Ok(AdminCredentials {
            realm: self.config.admin_realm.clone(),
            username: self.config.admin_username.clone(),
            password: self.config.admin_password.clone(),
            client_id,
            client_secret: self.config.admin_client_secret.clone(),
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
        let response = self
            .http
            .post_json(&operation, "/realms", token, &CreateRealmRequest { name })
            .await?;

        if response.is_success() {
            tracing::info!(realm = name, "realm created");
        } else if indicates_existing(&response) {
            tracing::warn!(realm = name, status = response.status, "realm already exists");
        } else {
            return Err(response.into_error(&operation));
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
        let request = CreateClientRequest::from(spec);
        let response = self.http.post_json(&operation, &path, token, &request).await?;

        if response.is_success() {
            tracing::info!(client_id = %spec.client_id, "client created");
            let created: Option<Value> = serde_json::from_str(&response.body).ok();
            if let Some(id) = created.as_ref().and_then(|c| string_field(c, "id")) {
                return Ok(id);
            }
        } else if indicates_existing(&response) {
            tracing::warn!(
                client_id = %spec.client_id,
                status = response.status,
                "client already exists"
            );
        } else {
            return Err(response.into_error(&operation));
        }

        self.find_client(token, realm, &spec.client_id)
            .await?
            .ok_or_else(|| {
                ProviderError::provision(
                    &operation,
                    404,
                    format!("client '{}' not found in realm listing", spec.client_id),
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
        let operation = format!("retrieve secret of client '{client_id}'");
        let path = format!("{}/clients/{}", Self::realm_path(&realm.name), encode(id));
        let response = self
            .http
            .get(&operation, &path, token)
            .await?
            .ensure_success(&operation)?;
        let client: Value = response.json(&operation)?;

        string_field(&client, "secret").ok_or_else(|| {
            ProviderError::provision(
                &operation,
                response.status,
                "client representation carries no secret",
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
        let request = CreateUserRequest {
            username: &user.username,
            firstname: &user.first_name,
            lastname: &user.last_name,
            email: &user.email,
            email_verified: true,
        };
        let path = format!("{}/users", Self::realm_path(&realm.name));
        let response = self.http.post_json(&operation, &path, token, &request).await?;

        if indicates_existing(&response) {
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
        let created: Option<Value> = serde_json::from_str(&response.body).ok();
        let user_id = match created.as_ref().and_then(|c| string_field(c, "id")) {
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
