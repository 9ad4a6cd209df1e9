//! # API Errors
//!
//! Every failure a handler or middleware can surface, mapped to a status
//! code and rendered as `{"error": ...}`.

use std::collections::BTreeMap;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

/// HTTP API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// No route or no record
    #[error("the requested resource could not be found")]
    NotFound,

    /// Route exists, method does not
    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),

    /// Body or query could not be decoded
    #[error("{0}")]
    BadRequest(String),

    /// Per-field validation messages
    #[error("validation failed")]
    FailedValidation(BTreeMap<String, String>),

    /// Stale version on update
    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    /// Admission denied
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    // ==================
    // Auth Errors
    // ==================
    #[error("{0}")]
    Auth(#[from] AuthError),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Detail is logged, never sent
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::UNAUTHORIZED)
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::EditConflict => ApiError::EditConflict,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::FailedValidation(errors) => json!({ "error": errors }),
            _ if status.is_server_error() => {
                error!(error = %self, "request failed");
                json!({ "error": SERVER_ERROR_MESSAGE })
            }
            _ => json!({ "error": self.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::Auth(e) = &self {
            if e.is_challenge() {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
        }
        response
    }
}
