//! Dispatcher behavior against a mock vault: state machine, busy
//! rejection, validation short-circuit, and error-kind mapping.

use keyvault_session::{
    CredentialField, Dispatcher, ErrorKind, OperationPayload, OperationRequest, OperationState,
};
use keyvault_client::{KeyVaultConfig, SecretsClient};
use kv_common::RetryConfig;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/tenant-a/oauth2/v2.0/token";

fn client(server: &MockServer) -> SecretsClient {
    let config = KeyVaultConfig::default()
        .with_authority_host(server.uri())
        .with_vault_endpoint(server.uri())
        .with_retry(
            RetryConfig::default()
                .without_jitter()
                .with_initial_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(5)),
        );
    SecretsClient::new(config).unwrap()
}

fn dispatcher(server: &MockServer) -> Dispatcher {
    let dispatcher = Dispatcher::new(client(server));
    dispatcher.set_credential_field(CredentialField::TenantId, "tenant-a");
    dispatcher.set_credential_field(CredentialField::ClientId, "client-a");
    dispatcher.set_credential_field(CredentialField::ClientSecret, "s3cret");
    dispatcher.set_credential_field(CredentialField::VaultName, "unit-vault");
    dispatcher
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3600,
            "access_token": "tok-1",
        })))
        .mount(server)
        .await;
}

fn secret_body(name: &str, version: &str, value: &str) -> serde_json::Value {
    serde_json::json!({
        "value": value,
        "id": format!("https://unit-vault.vault.azure.net/secrets/{name}/{version}"),
        "attributes": { "enabled": true }
    })
}

#[tokio::test]
async fn missing_credentials_fail_validation_without_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(client(&server));
    let result = dispatcher.execute(OperationRequest::List).await;

    assert!(!result.success);
    assert_eq!(result.error, Some(ErrorKind::Validation));
    assert_eq!(dispatcher.state(), OperationState::Failed);
}

#[tokio::test]
async fn malformed_vault_name_fails_validation_without_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    dispatcher.set_credential_field(CredentialField::VaultName, "team--vault");
    let result = dispatcher.execute(OperationRequest::List).await;

    assert_eq!(result.error, Some(ErrorKind::Validation));
}

#[tokio::test]
async fn set_requires_a_name_and_a_value() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);

    let result = dispatcher
        .execute(OperationRequest::Set {
            name: "  ".to_string(),
            value: "v".to_string(),
        })
        .await;
    assert_eq!(result.error, Some(ErrorKind::Validation));

    let result = dispatcher
        .execute(OperationRequest::Set {
            name: "app-key".to_string(),
            value: String::new(),
        })
        .await;
    assert_eq!(result.error, Some(ErrorKind::Validation));
}

#[tokio::test]
async fn list_success_reports_names() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/secrets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                { "id": "https://unit-vault.vault.azure.net/secrets/alpha" },
                { "id": "https://unit-vault.vault.azure.net/secrets/beta" },
            ]
        })))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let result = dispatcher.execute(OperationRequest::List).await;

    assert!(result.success);
    assert_eq!(result.message, "Found 2 secrets");
    assert_eq!(
        result.payload,
        OperationPayload::SecretNames(vec!["alpha".to_string(), "beta".to_string()])
    );
    assert_eq!(dispatcher.state(), OperationState::Succeeded);
}

#[tokio::test]
async fn get_success_carries_the_entry() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/secrets/app-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(secret_body("app-key", "0001", "hunter2")),
        )
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let result = dispatcher
        .execute(OperationRequest::Get {
            name: "app-key".to_string(),
        })
        .await;

    assert!(result.success);
    assert_eq!(result.message, "Retrieved secret 'app-key'");
    match result.payload {
        OperationPayload::Secret(entry) => {
            assert_eq!(entry.value, "hunter2");
            assert_eq!(entry.version, "0001");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn set_success_reports_the_new_version() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("PUT"))
        .and(path("/secrets/app-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(secret_body("app-key", "0002", "fresh")),
        )
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let result = dispatcher
        .execute(OperationRequest::Set {
            name: "app-key".to_string(),
            value: "fresh".to_string(),
        })
        .await;

    assert!(result.success);
    assert_eq!(result.message, "Stored a new version of secret 'app-key'");
    assert_eq!(dispatcher.state(), OperationState::Succeeded);
}

#[tokio::test]
async fn missing_secret_maps_to_not_found() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/secrets/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let result = dispatcher
        .execute(OperationRequest::Get {
            name: "ghost".to_string(),
        })
        .await;

    assert_eq!(result.error, Some(ErrorKind::NotFound));
    assert!(result.message.contains("ghost"));
    assert_eq!(dispatcher.state(), OperationState::Failed);
}

#[tokio::test]
async fn rejected_credentials_map_to_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "error": "invalid_client" })),
        )
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let result = dispatcher.execute(OperationRequest::List).await;

    assert_eq!(result.error, Some(ErrorKind::Auth));
    assert_eq!(dispatcher.state(), OperationState::Failed);
}

#[tokio::test]
async fn unreachable_vault_maps_to_network() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/secrets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let result = dispatcher.execute(OperationRequest::List).await;

    assert_eq!(result.error, Some(ErrorKind::Network));
}

#[tokio::test]
async fn second_operation_while_running_is_rejected_as_busy() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/secrets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "value": [] }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let dispatcher = Arc::new(dispatcher(&server));

    let first = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move { dispatcher.execute(OperationRequest::List).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dispatcher.state(), OperationState::Running);

    let second = dispatcher.execute(OperationRequest::List).await;
    assert!(second.is_busy());
    assert!(!second.success);

    // The rejected trigger does not disturb the first operation.
    let first = first.await.unwrap();
    assert!(first.success);
    assert_eq!(dispatcher.state(), OperationState::Succeeded);
}

#[tokio::test]
async fn closed_session_rejects_operations_and_clears_credentials() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    dispatcher.close();

    assert!(dispatcher.is_closed());
    assert!(dispatcher.credential_store().snapshot().validate().is_err());

    let result = dispatcher.execute(OperationRequest::List).await;
    assert!(!result.success);
    assert_eq!(dispatcher.state(), OperationState::Idle);
}

#[tokio::test]
async fn teardown_mid_operation_leaves_state_untouched() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/secrets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "value": [] }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let dispatcher = Arc::new(dispatcher(&server));

    let running = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move { dispatcher.execute(OperationRequest::List).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    dispatcher.close();

    // The in-flight call finishes best-effort, but the session state is
    // no longer updated after teardown.
    running.await.unwrap();
    assert_eq!(dispatcher.state(), OperationState::Running);
}
