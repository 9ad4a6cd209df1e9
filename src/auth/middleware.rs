//! Request authentication middleware.
//!
//! Runs inside admission control, so rejected requests never reach the
//! token table. The resolved [`Principal`] is stored as a request extension
//! for handlers to check permissions against.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::principal::Principal;
use super::token::Authenticator;
use crate::http_server::errors::ApiError;

/// `axum::middleware::from_fn_with_state` handler.
pub async fn authenticate(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticator.authenticate(req.headers()) {
        Ok(principal) => {
            req.extensions_mut().insert::<Principal>(principal);
            next.run(req).await
        }
        Err(e) => {
            debug!(error = %e, path = %req.uri().path(), "authentication failed");
            ApiError::Auth(e).into_response()
        }
    }
}
