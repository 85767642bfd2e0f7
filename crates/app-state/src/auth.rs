//! Credential validation
//!
//! The [`Authenticator`] trait is the seam between the session store and
//! whatever validates credentials. [`DemoAuthenticator`] accepts the single
//! demo account shipped with the app; [`RemoteAuthenticator`] goes through
//! the LMS backend.

use api_client::{ApiError, AuthService};
use async_trait::async_trait;
use thiserror::Error;

use crate::session::UserSession;

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Email or password not accepted
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Backend refused the request for another reason
    #[error("Sign-in rejected: {0}")]
    Rejected(String),

    /// Backend could not be reached
    #[error("Network error: {0}")]
    Network(String),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::SessionExpired | ApiError::Forbidden => AuthError::InvalidCredentials,
            ApiError::Status { status: 400 | 401 | 403 | 404 | 422, .. } => {
                AuthError::InvalidCredentials
            }
            ApiError::Network(message) => AuthError::Network(message),
            other => AuthError::Rejected(other.to_string()),
        }
    }
}

/// Email and password entered by the user
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Email address
    pub email: String,
    password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    /// Password
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validates credentials and produces the signed-in user
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Validate credentials
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserSession, AuthError>;

    /// Hook run when the user signs out
    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Email of the demo account
pub const DEMO_EMAIL: &str = "user@fpt.com";
/// Password of the demo account
pub const DEMO_PASSWORD: &str = "password";

/// Accepts only the built-in demo account
#[derive(Debug, Clone)]
pub struct DemoAuthenticator {
    user: UserSession,
}

impl DemoAuthenticator {
    /// Create the demo authenticator
    pub fn new() -> Self {
        Self {
            user: UserSession {
                id: "1".to_string(),
                name: "Viet Tran".to_string(),
                email: DEMO_EMAIL.to_string(),
                avatar: Some("https://i.pravatar.cc/150?img=11".to_string()),
            },
        }
    }

    /// User returned on a successful sign-in
    pub fn user(&self) -> &UserSession {
        &self.user
    }
}

impl Default for DemoAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for DemoAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        if credentials.email == DEMO_EMAIL && credentials.password() == DEMO_PASSWORD {
            Ok(self.user.clone())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Authenticates against the LMS backend
#[derive(Clone)]
pub struct RemoteAuthenticator {
    service: AuthService,
}

impl RemoteAuthenticator {
    /// Create an authenticator over an auth service
    pub fn new(service: AuthService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        let data = self.service.login(&credentials.email, credentials.password()).await?;

        if data.token.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let name = data
            .user
            .email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .unwrap_or(&data.user.email)
            .to_string();

        Ok(UserSession { id: data.user.id, name, email: data.user.email, avatar: None })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.service.logout().await.map_err(AuthError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::{ApiClient, ApiClientConfig};
    use serde_json::json;
    use std::sync::Arc;
    use storage::{keys, MemoryStore};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote(server: &MockServer, store: &MemoryStore) -> RemoteAuthenticator {
        let config = ApiClientConfig::new(server.uri());
        let client = ApiClient::new(config, Arc::new(store.clone())).unwrap();
        RemoteAuthenticator::new(AuthService::new(client))
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("user@fpt.com", "hunter2");
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("user@fpt.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_demo_account() {
        let auth = DemoAuthenticator::new();

        let user = auth.authenticate(&Credentials::new(DEMO_EMAIL, DEMO_PASSWORD)).await.unwrap();
        assert_eq!(user.id, "1");
        assert_eq!(user.name, "Viet Tran");
        assert_eq!(user.email, DEMO_EMAIL);

        let wrong = auth.authenticate(&Credentials::new(DEMO_EMAIL, "nope")).await;
        assert_eq!(wrong, Err(AuthError::InvalidCredentials));

        let unknown = auth.authenticate(&Credentials::new("other@fpt.com", DEMO_PASSWORD)).await;
        assert_eq!(unknown, Err(AuthError::InvalidCredentials));
    }

    #[test]
    fn test_api_error_mapping() {
        assert_eq!(AuthError::from(ApiError::SessionExpired), AuthError::InvalidCredentials);
        assert_eq!(
            AuthError::from(ApiError::Status { status: 422, message: String::new() }),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::from(ApiError::Network("refused".to_string())),
            AuthError::Network("refused".to_string())
        );
        assert!(matches!(
            AuthError::from(ApiError::Status { status: 503, message: "down".to_string() }),
            AuthError::Rejected(_)
        ));
    }

    #[tokio::test]
    async fn test_remote_sign_in() {
        let server = MockServer::start().await;
        let store = MemoryStore::new();

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "t-1",
                "user": {"id": "42", "email": "lan@fpt.com"}
            })))
            .mount(&server)
            .await;

        let auth = remote(&server, &store);
        let user = auth.authenticate(&Credentials::new("lan@fpt.com", "pw")).await.unwrap();

        assert_eq!(user.id, "42");
        assert_eq!(user.name, "lan");
        assert_eq!(user.avatar, None);
        assert!(store.peek(keys::AUTH_DATA).is_some());
    }

    #[tokio::test]
    async fn test_remote_rejects_bad_password() {
        let server = MockServer::start().await;
        let store = MemoryStore::new();

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let auth = remote(&server, &store);
        let result = auth.authenticate(&Credentials::new("lan@fpt.com", "bad")).await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_remote_sign_out_clears_auth_data() {
        let server = MockServer::start().await;
        let store = MemoryStore::with_entries([(
            keys::AUTH_DATA,
            r#"{"token":"t-1","user":{"id":"42","email":"lan@fpt.com"}}"#,
        )]);

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let auth = remote(&server, &store);
        auth.sign_out().await.unwrap();

        assert_eq!(store.peek(keys::AUTH_DATA), None);
    }
}
