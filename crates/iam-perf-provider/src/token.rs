//! OpenID Connect password grant.
//!
//! Both supported backends expose the token endpoint at
//! `/realms/{realm}/protocol/openid-connect/token`.

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};
use crate::http::HttpClient;

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type, usually `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Client used for a password grant.
#[derive(Debug, Clone, Copy)]
pub struct GrantClient<'a> {
    /// Client id.
    pub client_id: &'a str,
    /// Client secret, sent only when present.
    pub client_secret: Option<&'a str>,
}

/// Path of the token endpoint for `realm`.
#[must_use]
pub fn token_path(realm: &str) -> String {
    format!(
        "/realms/{}/protocol/openid-connect/token",
        urlencoding::encode(realm)
    )
}

/// Requests a token with the resource owner password grant.
///
/// Any non-2xx status, or a response without `access_token`, is an
/// authentication error carrying the raw status and body.
pub async fn password_grant(
    http: &HttpClient,
    realm: &str,
    client: GrantClient<'_>,
    username: &str,
    password: &str,
) -> ProviderResult<(String, TokenResponse)> {
    let operation = format!("password grant for '{username}' in realm '{realm}'");

    let mut form = vec![
        ("grant_type", "password"),
        ("client_id", client.client_id),
        ("username", username),
        ("password", password),
    ];
    if let Some(secret) = client.client_secret {
        form.push(("client_secret", secret));
    }

    let response = http.post_form(&operation, &token_path(realm), &form).await?;

    if !response.is_success() {
        return Err(ProviderError::Auth {
            message: format!("token request rejected for '{username}'"),
            status: response.status,
            body: response.body,
        });
    }

    let token: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
        ProviderError::Auth {
            message: format!("malformed token response: {e}"),
            status: response.status,
            body: response.body.clone(),
        }
    })?;

    match token.access_token.clone().filter(|t| !t.is_empty()) {
        Some(access_token) => Ok((access_token, token)),
        None => Err(ProviderError::Auth {
            message: "no access_token in response".to_string(),
            status: response.status,
            body: response.body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_path_encodes_realm() {
        assert_eq!(
            token_path("master"),
            "/realms/master/protocol/openid-connect/token"
        );
        assert_eq!(
            token_path("perf realm"),
            "/realms/perf%20realm/protocol/openid-connect/token"
        );
    }

    #[test]
    fn token_response_tolerates_missing_fields() {
        let token: TokenResponse = serde_json::from_str("{}").unwrap();
        assert!(token.access_token.is_none());

        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"Bearer","expires_in":300}"#)
                .unwrap();
        assert_eq!(token.access_token.as_deref(), Some("abc"));
        assert_eq!(token.expires_in, Some(300));
    }
}
