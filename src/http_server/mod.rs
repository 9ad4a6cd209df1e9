//! # HTTP Server Module
//!
//! JSON API for the coin catalogue, served with axum.
//!
//! # Endpoints
//!
//! - `/v1/healthcheck` - Health check
//! - `/v1/coins` - List and create
//! - `/v1/coins/{id}` - Fetch, version-checked update, delete

pub mod coin_routes;
pub mod config;
pub mod errors;
pub mod health_routes;
pub mod params;
pub mod server;
pub mod state;

pub use config::{Environment, HttpServerConfig, LogFormat};
pub use errors::{ApiError, ApiResult};
pub use server::HttpServer;
pub use state::AppState;
