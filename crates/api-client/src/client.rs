//! HTTP client implementation
//!
//! This module implements the request/response plumbing used by the LMS
//! services: request builders, configuration, bearer token injection and
//! the 401/403 handling that clears persisted auth data.

use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storage::{keys, KeyValueStore, KeyValueStoreExt};

use crate::auth::LoginData;
use crate::{ApiError, Result};

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method for API requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A request to an API endpoint
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Endpoint path relative to the versioned base URL (e.g. "/auth/login")
    pub path: String,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// JSON request body
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request with an explicit method
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body from JSON
    pub fn json_body<T: Serialize>(mut self, value: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Decoded API response
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self { status, headers, data }
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(key)
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base service URL (e.g. "https://api.example.com")
    pub base_url: String,
    /// Version prefix inserted between the base URL and endpoint paths
    pub version_prefix: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers included in every request
    pub default_headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        Self {
            base_url: "https://api.example.com".to_string(),
            version_prefix: "/api/v1".to_string(),
            timeout: Duration::from_secs(20),
            user_agent: format!("LMS-Client/{}", env!("CARGO_PKG_VERSION")),
            default_headers,
        }
    }
}

impl ApiClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Set the version prefix (use "" for none)
    pub fn with_version_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.version_prefix = prefix.into();
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Full URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.version_prefix.trim_end_matches('/');
        let prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{}", prefix)
        };
        let path = if path.starts_with('/') { path.to_string() } else { format!("/{}", path) };
        format!("{}{}{}", base, prefix, path)
    }
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the LMS API
///
/// Every request carries `Authorization: Bearer <token>` when the
/// `auth_data` key holds a login. A 401 or 403 answer removes that key and
/// surfaces [`ApiError::SessionExpired`] or [`ApiError::Forbidden`].
#[derive(Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    config: ApiClientConfig,
    store: Arc<dyn KeyValueStore>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ApiClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config, store })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Store holding the auth data
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Make a GET request
    pub async fn get<T>(&self, path: &str) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.send(ApiRequest::get(path)).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json_body(body)?).await
    }

    /// Execute a request
    pub async fn send<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.config.url(&request.path);

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        for (key, value) in &request.params {
            req = req.query(&[(key, value)]);
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        if let Some(token) = self.bearer_token().await {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        tracing::debug!(method = request.method.as_str(), %url, "sending request");

        let response = req
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Request failed: {}", e)))?;

        self.parse_response(response).await
    }

    /// Token from the persisted auth data, if any
    async fn bearer_token(&self) -> Option<String> {
        let data: storage::Result<Option<LoginData>> = self.store.get_json(keys::AUTH_DATA).await;
        match data {
            Ok(data) => data.map(|d| d.token).filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read auth data, sending request without token: {}", e);
                None
            }
        }
    }

    /// Drop the persisted auth data after the server rejected it
    async fn clear_auth_data(&self) {
        if let Err(e) = self.store.remove(keys::AUTH_DATA).await {
            tracing::error!("Failed to clear auth data after rejection: {}", e);
        }
    }

    /// Parse a reqwest response into an ApiResponse
    async fn parse_response<T>(&self, response: ReqwestResponse) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.to_string(), value_str.to_string());
            }
        }

        match status {
            401 => {
                tracing::warn!("Server rejected token (401), clearing auth data");
                self.clear_auth_data().await;
                return Err(ApiError::SessionExpired);
            }
            403 => {
                tracing::warn!("Server denied access (403), clearing auth data");
                self.clear_auth_data().await;
                return Err(ApiError::Forbidden);
            }
            _ => {}
        }

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to read response: {}", e)))?;

        // Empty bodies (e.g. 204) decode as JSON null
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };

        let data: T = serde_json::from_str(body)
            .map_err(|e| ApiError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Ok(ApiResponse::new(status, headers, data))
    }
}
