//! Extra client definitions loaded from a JSON fixture file.

use std::path::Path;

use iam_perf_provider::ClientSpec;
use serde::Deserialize;

use crate::{CliError, CliResult};

/// A client to ensure alongside the default pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientFixture {
    /// OAuth2 client id.
    pub client_id: String,

    /// Display name. Defaults to the client id.
    #[serde(default)]
    pub name: Option<String>,

    /// Public clients get no secret.
    #[serde(default)]
    pub public_client: bool,

    /// Client credentials grant. Off unless requested.
    #[serde(default, alias = "service_accounts_enabled")]
    pub service_account_enabled: bool,

    /// Resource owner password grant.
    #[serde(default = "enabled_by_default")]
    pub direct_access_grants_enabled: bool,

    /// Authorization code flow.
    #[serde(default = "enabled_by_default")]
    pub standard_flow_enabled: bool,

    /// Protocol.
    #[serde(default)]
    pub protocol: Option<String>,

    /// Whether the client is enabled.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ClientFixture {
    /// Client definition handed to the provider.
    #[must_use]
    pub fn to_spec(&self) -> ClientSpec {
        ClientSpec {
            client_id: self.client_id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.client_id.clone()),
            enabled: self.enabled,
            protocol: self
                .protocol
                .clone()
                .unwrap_or_else(|| "openid-connect".to_string()),
            public_client: self.public_client,
            service_accounts_enabled: self.service_account_enabled,
            direct_access_grants_enabled: self.direct_access_grants_enabled,
            standard_flow_enabled: self.standard_flow_enabled,
        }
    }
}

/// Loads client fixtures from `path`.
///
/// A missing file yields an empty list and a warning; a file that is not a
/// JSON list of clients is a configuration error.
pub fn load_clients_fixture(path: &Path) -> CliResult<Vec<ClientFixture>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "clients fixture not found, skipping");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    parse_clients(&content)
        .map_err(|e| CliError::Config(format!("invalid clients fixture {}: {e}", path.display())))
}

fn parse_clients(content: &str) -> Result<Vec<ClientFixture>, serde_json::Error> {
    let clients: Vec<ClientFixture> = serde_json::from_str(content)?;
    Ok(clients
        .into_iter()
        .filter(|c| !c.client_id.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_with_defaults() {
        let clients = parse_clients(
            r#"[
                {"client_id": "api-gateway", "name": "Gateway"},
                {"client_id": "spa", "public_client": true},
                {"client_id": "  "}
            ]"#,
        )
        .unwrap();

        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].client_id, "api-gateway");
        assert_eq!(clients[0].name.as_deref(), Some("Gateway"));
        assert!(!clients[0].public_client);
        assert!(clients[1].public_client);
    }

    #[test]
    fn client_definition_carries_name_and_flags() {
        let clients = parse_clients(
            r#"[
                {"client_id": "gateway", "name": "API Gateway", "service_account_enabled": true,
                 "direct_access_grants_enabled": false},
                {"client_id": "spa", "public_client": true}
            ]"#,
        )
        .unwrap();

        let gateway = clients[0].to_spec();
        assert_eq!(gateway.name, "API Gateway");
        assert!(gateway.service_accounts_enabled);
        assert!(!gateway.direct_access_grants_enabled);
        assert!(gateway.enabled);
        assert_eq!(gateway.protocol, "openid-connect");

        let spa = clients[1].to_spec();
        assert_eq!(spa.name, "spa");
        assert!(spa.public_client);
        assert!(!spa.service_accounts_enabled);
        assert!(spa.direct_access_grants_enabled);
    }

    #[test]
    fn rejects_non_list() {
        assert!(parse_clients(r#"{"client_id": "x"}"#).is_err());
        assert!(parse_clients("not json").is_err());
    }

    #[test]
    fn missing_file_is_empty() {
        let clients = load_clients_fixture(Path::new("/nonexistent/clients.json")).unwrap();
        assert!(clients.is_empty());
    }
}
