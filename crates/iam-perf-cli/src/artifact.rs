//! Generated environment artifact.
//!
//! The artifact is a dotenv file read by the load scenarios. It is written
//! in one piece after every seed step has succeeded.

use std::path::Path;

use iam_perf_provider::ProviderKind;

use crate::{CliError, CliResult};

/// Everything a seed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureBundle {
    /// Backend the fixtures live on.
    pub provider: ProviderKind,
    /// Server base URL.
    pub base_url: String,
    /// Performance realm.
    pub realm: String,
    /// Confidential client id.
    pub client_id: String,
    /// Confidential client secret.
    pub client_secret: String,
    /// Public client id.
    pub public_client_id: String,
    /// Client ids ensured from the clients fixture.
    pub extra_clients: Vec<String>,
    /// Usernames created by this run, in index order.
    pub usernames: Vec<String>,
    /// Username for single-user scenarios. Empty when no users were requested.
    pub test_username: String,
    /// Password shared by every user.
    pub test_password: String,
    /// Users requested.
    pub user_count: usize,
    /// Virtual users for the load scenarios.
    pub vus: u32,
    /// Scenario duration.
    pub duration: String,
}

impl FixtureBundle {
    /// Artifact entries in file order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("IAM_PROVIDER", self.provider.as_str().to_string()),
            ("BASE_URL", self.base_url.clone()),
            ("REALM", self.realm.clone()),
            ("CLIENT_ID", self.client_id.clone()),
            ("CLIENT_SECRET", self.client_secret.clone()),
            ("PUBLIC_CLIENT_ID", self.public_client_id.clone()),
            ("TEST_USERNAME", self.test_username.clone()),
            ("TEST_PASSWORD", self.test_password.clone()),
            ("USER_COUNT", self.user_count.to_string()),
            ("VUS", self.vus.to_string()),
            ("DURATION", self.duration.clone()),
        ]
    }

    /// Renders the artifact contents.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "# Generated by iam-perf seed for {} ({}). Do not edit.\n",
            self.provider.display_name(),
            self.realm
        );
        for (key, value) in self.entries() {
            out.push_str(key);
            out.push('=');
            out.push_str(&quote_value(&value));
            out.push('\n');
        }
        out
    }

    /// Writes the artifact, replacing any previous file.
    pub fn write_to(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render())?;
        tracing::info!(path = %path.display(), "artifact written");
        Ok(())
    }
}

/// Quotes a value when dotenv parsing would otherwise alter it.
fn quote_value(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '$'));
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '$' => quoted.push_str("\\$"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Values read back from an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLogin {
    /// Server base URL.
    pub base_url: String,
    /// Performance realm.
    pub realm: String,
    /// Confidential client id.
    pub client_id: String,
    /// Confidential client secret.
    pub client_secret: String,
    /// Test username.
    pub username: String,
    /// Test password.
    pub password: String,
}

/// Reads the login values of an artifact.
pub fn read_artifact(path: &Path) -> CliResult<ArtifactLogin> {
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| CliError::Config(format!("failed to read {}: {e}", path.display())))?;

    let mut values = std::collections::HashMap::new();
    for item in iter {
        let (key, value) = item
            .map_err(|e| CliError::Config(format!("failed to parse {}: {e}", path.display())))?;
        values.insert(key, value);
    }

    let take = |key: &str| -> CliResult<String> {
        values
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| CliError::MissingArtifactKey {
                path: path.display().to_string(),
                key: key.to_string(),
            })
    };

    Ok(ArtifactLogin {
        base_url: take("BASE_URL")?,
        realm: take("REALM")?,
        client_id: take("CLIENT_ID")?,
        client_secret: take("CLIENT_SECRET")?,
        username: take("TEST_USERNAME")?,
        password: take("TEST_PASSWORD")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> FixtureBundle {
        FixtureBundle {
            provider: ProviderKind::Keycloak,
            base_url: "http://localhost:8080".to_string(),
            realm: "perf".to_string(),
            client_id: "perf-client-ab12cd34".to_string(),
            client_secret: "s3cr3t".to_string(),
            public_client_id: "perf-public-client".to_string(),
            extra_clients: vec![],
            usernames: vec!["perf-user-001".to_string(), "perf-user-002".to_string()],
            test_username: "perf-user-001".to_string(),
            test_password: "perf password #1".to_string(),
            user_count: 2,
            vus: 10,
            duration: "30s".to_string(),
        }
    }

    #[test]
    fn quoting() {
        assert_eq!(quote_value("plain-value"), "plain-value");
        assert_eq!(quote_value(""), "");
        assert_eq!(quote_value("has space"), "\"has space\"");
        assert_eq!(quote_value("a#b"), "\"a#b\"");
        assert_eq!(quote_value(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote_value(r"back\slash"), r#""back\\slash""#);
    }

    #[test]
    fn render_lists_keys_in_order() {
        let rendered = bundle().render();
        let keys: Vec<&str> = rendered
            .lines()
            .filter(|l| !l.starts_with('#'))
            .filter_map(|l| l.split_once('=').map(|(k, _)| k))
            .collect();
        assert_eq!(
            keys,
            [
                "IAM_PROVIDER",
                "BASE_URL",
                "REALM",
                "CLIENT_ID",
                "CLIENT_SECRET",
                "PUBLIC_CLIENT_ID",
                "TEST_USERNAME",
                "TEST_PASSWORD",
                "USER_COUNT",
                "VUS",
                "DURATION"
            ]
        );
        assert!(rendered.contains("IAM_PROVIDER=keycloak\n"));
        assert!(rendered.contains("TEST_USERNAME=perf-user-001\n"));
        assert!(rendered.contains("TEST_PASSWORD=\"perf password #1\"\n"));
    }

    #[test]
    fn written_artifact_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".env.perf");
        bundle().write_to(&path).unwrap();

        let login = read_artifact(&path).unwrap();
        assert_eq!(login.username, "perf-user-001");
        assert_eq!(login.password, "perf password #1");
        assert_eq!(login.client_secret, "s3cr3t");
    }

    #[test]
    fn empty_test_username_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.perf");
        let mut bundle = bundle();
        bundle.test_username = String::new();
        bundle.write_to(&path).unwrap();

        let err = read_artifact(&path).unwrap_err();
        assert!(matches!(err, CliError::MissingArtifactKey { ref key, .. } if key == "TEST_USERNAME"));
    }
}
