//! FerrisKey adapter tests against a mock admin API.

use std::collections::HashMap;

use iam_perf_provider::{
    build_provider, AdminToken, IamProvider, ProviderConfig, ProviderError, RealmRef, UserNaming,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, extra: &[(&str, &str)]) -> ProviderConfig {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("IAM_PROVIDER".to_string(), "ferriskey".to_string());
    vars.insert("BASE_URL".to_string(), server.uri());
    vars.insert("ADMIN_CLIENT_ID".to_string(), "admin-service".to_string());
    for (k, v) in extra {
        vars.insert((*k).to_string(), (*v).to_string());
    }
    ProviderConfig::from_lookup(|key: &str| vars.get(key).cloned()).unwrap()
}

fn token() -> AdminToken {
    AdminToken::new("admin-token")
}

#[tokio::test]
async fn authenticate_with_service_account_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms/master/protocol/openid-connect/token"))
        .and(body_string_contains("client_id=admin-service"))
        .and(body_string_contains("client_secret=svc-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fk-token"})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[("ADMIN_CLIENT_SECRET", "svc-secret")])).unwrap();
    let credentials = provider.admin_credentials().unwrap();
    let token = provider.authenticate(&credentials).await.unwrap();
    assert_eq!(token.as_str(), "fk-token");
}

#[tokio::test]
async fn realm_exists_detection_via_400_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"name": "perf-realm"}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/realms"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Realm already exists"})),
        )
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    let first = provider.ensure_realm(&token(), "perf-realm").await.unwrap();
    let second = provider.ensure_realm(&token(), "perf-realm").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn realm_bad_request_without_exists_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "invalid name"})))
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    let err = provider.ensure_realm(&token(), "bad name").await.unwrap_err();
    assert!(matches!(err, ProviderError::Provision { status: 400, conflict: false, .. }));
}

#[tokio::test]
async fn confidential_client_created_then_retrieved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms/perf-realm/clients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "c-1"}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/realms/perf-realm/clients"))
        .respond_with(ResponseTemplate::new(409).set_body_string("client already exists"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/realms/perf-realm/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"id": "c-0", "client_id": "other"},
            {"id": "c-1", "client_id": "perf-client"}
        ]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/realms/perf-realm/clients/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
            "id": "c-1", "client_id": "perf-client", "secret": "fk-secret"
        }})))
        .expect(2)
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    let realm = RealmRef::new("perf-realm");
    let first = provider
        .ensure_confidential_client(&token(), &realm, Some("perf-client"))
        .await
        .unwrap();
    let second = provider
        .ensure_confidential_client(&token(), &realm, Some("perf-client"))
        .await
        .unwrap();

    assert_eq!(first.client_secret, "fk-secret");
    assert_eq!(first, second);
}

#[tokio::test]
async fn secret_absent_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms/perf-realm/clients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "c-2"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/realms/perf-realm/clients/c-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c-2"})))
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    let err = provider
        .ensure_confidential_client(&token(), &RealmRef::new("perf-realm"), Some("perf-client"))
        .await
        .unwrap_err();
    match err {
        ProviderError::Provision { operation, .. } => {
            assert!(operation.contains("secret"));
        }
        other => panic!("expected provision error, got {other:?}"),
    }
}

#[tokio::test]
async fn users_created_with_lowercase_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms/perf-realm/users"))
        .and(body_string_contains(r#""firstname":"Perf""#))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "u-1"}})))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/realms/perf-realm/users/[^/]+/reset-password$"))
        .and(body_string_contains(r#""credential_type":"password""#))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    let batch = provider
        .create_users(
            &token(),
            &RealmRef::new("perf-realm"),
            3,
            "perf-password",
            &UserNaming::default(),
        )
        .await;

    assert_eq!(
        batch.created,
        vec!["perf-user-001", "perf-user-002", "perf-user-003"]
    );
}

#[tokio::test]
async fn existing_user_password_is_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms/perf-realm/users"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "User already exists"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/realms/perf-realm/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"id": "u-7", "username": "perf-user-001"}
        ]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/realms/perf-realm/users/u-7/reset-password"))
        .and(body_string_contains(r#""value":"rotated""#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    let batch = provider
        .create_users(
            &token(),
            &RealmRef::new("perf-realm"),
            1,
            "rotated",
            &UserNaming::default(),
        )
        .await;

    assert!(batch.failures[0].error.is_conflict());
    assert_eq!(batch.first_usable_username(), Some("perf-user-001"));
}

#[tokio::test]
async fn client_created_without_body_is_found_in_listing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms/perf-realm/clients"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/realms/perf-realm/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c-5", "client_id": "perf-public-client"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    let client_id = provider
        .ensure_public_client(&token(), &RealmRef::new("perf-realm"), "perf-public-client")
        .await
        .unwrap();
    assert_eq!(client_id, "perf-public-client");
}

#[tokio::test]
async fn password_failure_is_recorded_per_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/realms/perf-realm/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "u-1"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/realms/perf-realm/users/[^/]+/reset-password$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    let batch = provider
        .create_users(&token(), &RealmRef::new("perf-realm"), 2, "pw", &UserNaming::default())
        .await;

    assert!(batch.created.is_empty());
    assert_eq!(batch.failures.len(), 2);
    assert!(batch
        .failures
        .iter()
        .all(|f| matches!(f.error, ProviderError::Provision { status: 500, .. })));
}

#[tokio::test]
async fn cleanup_then_realm_is_created_again() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/realms/perf-realm"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/realms"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"name": "perf-realm"}})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = build_provider(config(&server, &[])).unwrap();
    provider.cleanup_realm(&token(), "perf-realm").await.unwrap();
    let realm = provider.ensure_realm(&token(), "perf-realm").await.unwrap();
    assert_eq!(realm.name, "perf-realm");
}
