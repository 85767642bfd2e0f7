//! REST client for the LMS backend
//!
//! This crate provides the thin HTTP collaborator used by the client core:
//! request/response types, bearer token injection from the persisted
//! auth data, session-expiry handling, endpoint paths, and the
//! authentication service.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod endpoints;

pub use auth::{AuthService, AuthUser, LoginData, RegisterParams};
pub use client::{ApiClient, ApiClientConfig, ApiRequest, ApiResponse, HttpMethod};

/// Message returned to the caller when the server answers 401
pub const SESSION_EXPIRED_MESSAGE: &str = "Phiên đăng nhập hết hạn";

/// Message returned to the caller when the server answers 403
pub const FORBIDDEN_MESSAGE: &str = "Bạn không có quyền truy cập";

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error types for API operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Server rejected the bearer token (HTTP 401)
    #[error("Phiên đăng nhập hết hạn")]
    SessionExpired,

    /// Server refused access to the resource (HTTP 403)
    #[error("Bạn không có quyền truy cập")]
    Forbidden,

    /// Request could not be sent or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Request body could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persisted auth data could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] storage::KvError),
}

impl ApiError {
    /// HTTP status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::SessionExpired => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error forces the user back to sign-in
    pub fn requires_sign_out(&self) -> bool {
        matches!(self, ApiError::SessionExpired | ApiError::Forbidden)
    }
}
