//! Health Routes
//!
//! Liveness endpoint. Open to every caller, admission control still applies.

use axum::extract::State;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::state::AppState;

/// Build details reported alongside the status
#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub environment: String,
    pub version: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub system_info: SystemInfo,
}

/// Create health routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/v1/healthcheck", get(healthcheck_handler))
}

async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "available".to_string(),
        system_info: SystemInfo {
            environment: state.env.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "available".to_string(),
            system_info: SystemInfo {
                environment: "development".to_string(),
                version: "0.1.0".to_string(),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["system_info"]["environment"], "development");
    }
}
