//! Integration tests for the API client
//!
//! These tests use wiremock to stand in for the LMS backend and check the
//! full request/response cycle: token injection, 401/403 handling and the
//! auth service's persistence of login data.

use api_client::{
    ApiClient, ApiClientConfig, ApiError, AuthService, AuthUser, LoginData, FORBIDDEN_MESSAGE,
    SESSION_EXPIRED_MESSAGE,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use storage::{keys, KeyValueStore, KeyValueStoreExt, MemoryStore};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
struct Course {
    id: u32,
    title: String,
}

fn client_for(server: &MockServer, store: &MemoryStore) -> ApiClient {
    let config = ApiClientConfig::new(server.uri()).with_version_prefix("/api/v1");
    let store: Arc<dyn KeyValueStore> = Arc::new(store.clone());
    ApiClient::new(config, store).unwrap()
}

fn login_data(token: &str) -> LoginData {
    LoginData {
        token: token.to_string(),
        user: AuthUser { id: "1".to_string(), email: "user@fpt.com".to_string() },
    }
}

// =============================================================================
// Request Tests
// =============================================================================

#[tokio::test]
async fn test_get_success_with_version_prefix() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    let courses = vec![Course { id: 1, title: "Rust Basics".to_string() }];

    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&courses))
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let response = client.get::<Vec<Course>>("/courses").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.data, courses);
}

#[tokio::test]
async fn test_bearer_token_injected_from_auth_data() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    store.set_json(keys::AUTH_DATA, &login_data("secret-token")).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/user/profile"))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Viet Tran"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let response = client.get::<serde_json::Value>("/user/profile").await.unwrap();

    assert_eq!(response.data["name"], "Viet Tran");
}

#[tokio::test]
async fn test_no_authorization_header_without_auth_data() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    client.get::<Vec<Course>>("/courses").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

// =============================================================================
// Rejection Tests
// =============================================================================

#[tokio::test]
async fn test_401_clears_auth_data_and_reports_expiry() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    store.set_json(keys::AUTH_DATA, &login_data("stale")).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let err = client.get::<Vec<Course>>("/courses").await.unwrap_err();

    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(err.to_string(), SESSION_EXPIRED_MESSAGE);
    assert_eq!(store.peek(keys::AUTH_DATA), None);
}

#[tokio::test]
async fn test_403_clears_auth_data_and_reports_forbidden() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    store.set_json(keys::AUTH_DATA, &login_data("limited")).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/courses/9/enroll"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let err = client
        .post::<_, serde_json::Value>(&api_client::endpoints::course::enroll(9), &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Forbidden));
    assert_eq!(err.to_string(), FORBIDDEN_MESSAGE);
    assert_eq!(store.peek(keys::AUTH_DATA), None);
}

#[tokio::test]
async fn test_other_errors_keep_auth_data() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    store.set_json(keys::AUTH_DATA, &login_data("valid")).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let err = client.get::<Vec<Course>>("/courses").await.unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("Expected status error, got {:?}", other),
    }
    assert!(store.peek(keys::AUTH_DATA).is_some());
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, &store);
    let err = client.get::<Vec<Course>>("/courses").await.unwrap_err();

    assert!(matches!(err, ApiError::Parse(_)));
}

// =============================================================================
// Auth Service Tests
// =============================================================================

#[tokio::test]
async fn test_login_persists_auth_data() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"email": "user@fpt.com", "password": "password"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_data("fresh")))
        .mount(&server)
        .await;

    let auth = AuthService::new(client_for(&server, &store));
    let data = auth.login("user@fpt.com", "password").await.unwrap();

    assert_eq!(data.token, "fresh");
    assert_eq!(auth.stored_login().await.unwrap(), Some(login_data("fresh")));
}

#[tokio::test]
async fn test_login_with_empty_token_is_not_persisted() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_data("")))
        .mount(&server)
        .await;

    let auth = AuthService::new(client_for(&server, &store));
    auth.login("user@fpt.com", "password").await.unwrap();

    assert_eq!(store.peek(keys::AUTH_DATA), None);
}

#[tokio::test]
async fn test_logout_clears_auth_data_even_when_server_fails() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    store.set_json(keys::AUTH_DATA, &login_data("bye")).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .and(header("Authorization", "Bearer bye"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthService::new(client_for(&server, &store));
    auth.logout().await.unwrap();

    assert_eq!(store.peek(keys::AUTH_DATA), None);
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/forgot-password"))
        .and(body_json(json!({"email": "user@fpt.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sent": true})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/reset-password"))
        .and(body_json(json!({"token": "reset-123", "password": "n3w"})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let auth = AuthService::new(client_for(&server, &store));

    let sent = auth.forgot_password("user@fpt.com").await.unwrap();
    assert_eq!(sent["sent"], true);

    let reset = auth.reset_password("reset-123", "n3w").await.unwrap();
    assert!(reset.is_null());
}
