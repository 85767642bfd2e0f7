//! Authentication service
//!
//! Wraps the auth endpoints and keeps the persisted `auth_data` record in
//! step with the server: a successful login stores it, logout always
//! removes it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::{keys, KeyValueStoreExt};

use crate::client::ApiClient;
use crate::endpoints;
use crate::{ApiError, Result};

/// User identity carried in the login response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Server-side user id
    pub id: String,
    /// Email used to sign in
    pub email: String,
}

/// Login response persisted under the auth-data key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    /// Bearer token
    pub token: String,
    /// Signed-in user
    pub user: AuthUser,
}

/// Account registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterParams {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Authentication API calls
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    /// Create an auth service over a client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Underlying API client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Log in and persist the returned auth data
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData> {
        let response = self
            .client
            .post::<_, LoginData>(endpoints::auth::LOGIN, &Credentials { email, password })
            .await?;
        let data = response.data;

        if !data.token.is_empty() {
            self.client.store().set_json(keys::AUTH_DATA, &data).await?;
            tracing::info!(user_id = %data.user.id, "logged in");
        }

        Ok(data)
    }

    /// Register a new account
    pub async fn register(&self, params: &RegisterParams) -> Result<Value> {
        let response = self.client.post(endpoints::auth::REGISTER, params).await?;
        Ok(response.data)
    }

    /// Log out on the server and always drop the local auth data
    pub async fn logout(&self) -> Result<()> {
        let server = self
            .client
            .post::<_, Value>(endpoints::auth::LOGOUT, &Value::Null)
            .await;
        if let Err(e) = server {
            tracing::debug!("Logout call failed, clearing auth data anyway: {}", e);
        }

        self.client.store().remove(keys::AUTH_DATA).await?;
        Ok(())
    }

    /// Request a password reset mail
    pub async fn forgot_password(&self, email: &str) -> Result<Value> {
        let body = serde_json::json!({ "email": email });
        let response = self.client.post(endpoints::auth::FORGOT_PASSWORD, &body).await?;
        Ok(response.data)
    }

    /// Set a new password using a reset token
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<Value> {
        let body = serde_json::json!({ "token": token, "password": password });
        let response = self.client.post(endpoints::auth::RESET_PASSWORD, &body).await?;
        Ok(response.data)
    }

    /// Auth data persisted by the last login, if any
    pub async fn stored_login(&self) -> Result<Option<LoginData>> {
        self.client
            .store()
            .get_json(keys::AUTH_DATA)
            .await
            .map_err(ApiError::from)
    }
}
