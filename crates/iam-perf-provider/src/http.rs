//! HTTP client wrapper used by every adapter.
//!
//! Requests return an [`HttpResponse`] snapshot (status, `Location` header,
//! body text) so adapters can apply their own "already exists" rules.
//! Transport failures are classified as [`ProviderError::TransientNetwork`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::AdminToken;

/// API client for a single IAM server.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Creates a new client with the given per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Makes a form-encoded POST request (token endpoint).
    pub async fn post_form(
        &self,
        operation: &str,
        path: &str,
        form: &[(&str, &str)],
    ) -> ProviderResult<HttpResponse> {
        let request = self.client.post(self.url(path)).form(form);
        send(operation, request).await
    }

    /// Makes an authenticated GET request.
    pub async fn get(
        &self,
        operation: &str,
        path: &str,
        token: &AdminToken,
    ) -> ProviderResult<HttpResponse> {
        let request = self.client.get(self.url(path)).bearer_auth(token.as_str());
        send(operation, request).await
    }

    /// Makes an authenticated POST request with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        token: &AdminToken,
        body: &B,
    ) -> ProviderResult<HttpResponse> {
        let request = self
            .client
            .post(self.url(path))
            .bearer_auth(token.as_str())
            .json(body);
        send(operation, request).await
    }

    /// Makes an authenticated POST request without a body.
    pub async fn post_empty(
        &self,
        operation: &str,
        path: &str,
        token: &AdminToken,
    ) -> ProviderResult<HttpResponse> {
        let request = self.client.post(self.url(path)).bearer_auth(token.as_str());
        send(operation, request).await
    }

    /// Makes an authenticated PUT request with a JSON body.
    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        token: &AdminToken,
        body: &B,
    ) -> ProviderResult<HttpResponse> {
        let request = self
            .client
            .put(self.url(path))
            .bearer_auth(token.as_str())
            .json(body);
        send(operation, request).await
    }

    /// Makes an authenticated DELETE request.
    pub async fn delete(
        &self,
        operation: &str,
        path: &str,
        token: &AdminToken,
    ) -> ProviderResult<HttpResponse> {
        let request = self.client.delete(self.url(path)).bearer_auth(token.as_str());
        send(operation, request).await
    }
}

/// Sends a request and captures the response.
async fn send(operation: &str, request: reqwest::RequestBuilder) -> ProviderResult<HttpResponse> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::transport(operation, &e))?;

    let status = response.status().as_u16();
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::transport(operation, &e))?;

    tracing::debug!(operation, status, "IAM request completed");

    Ok(HttpResponse {
        status,
        location,
        body,
    })
}

/// Captured HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Location` header, if present.
    pub location: Option<String>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Last path segment of the `Location` header (the created resource id).
    #[must_use]
    pub fn location_id(&self) -> Option<String> {
        self.location
            .as_deref()
            .and_then(|l| l.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    /// Decodes the body as JSON; an unexpected shape is a provision error.
    pub fn json<T: DeserializeOwned>(&self, operation: &str) -> ProviderResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            ProviderError::provision(
                operation,
                self.status,
                format!("unexpected response body ({e}): {}", self.body),
            )
        })
    }

    /// Converts a non-success response into a provision error.
    #[must_use]
    pub fn into_error(self, operation: &str) -> ProviderError {
        ProviderError::provision(operation, self.status, self.body)
    }

    /// Returns the response if successful, otherwise a provision error.
    pub fn ensure_success(self, operation: &str) -> ProviderResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error(operation))
        }
    }
}
