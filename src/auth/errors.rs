//! # Auth Errors
//!
//! Error types for request authentication and permission checks.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and authorization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    // ==================
    // Authentication Errors
    // ==================
    /// Authorization header present but malformed, or token unknown
    #[error("invalid or missing authentication token")]
    InvalidToken,

    /// Anonymous caller hit a protected resource
    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    // ==================
    // Authorization Errors
    // ==================
    /// Authenticated, but the permission is not granted
    #[error("your user account doesn't have the necessary permissions to access this resource")]
    NotPermitted,

    // ==================
    // Configuration Errors
    // ==================
    /// Token table is unusable
    #[error("invalid auth configuration: {0}")]
    InvalidConfig(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 401 Unauthorized
            AuthError::InvalidToken => 401,
            AuthError::AuthenticationRequired => 401,

            // 403 Forbidden
            AuthError::NotPermitted => 403,

            // 500 Internal Server Error
            AuthError::InvalidConfig(_) => 500,
        }
    }

    /// Whether the response should carry a `WWW-Authenticate` challenge
    pub fn is_challenge(&self) -> bool {
        self.status_code() == 401
    }
}
