//! # HTTP Server
//!
//! Builds the router, wraps it in the middleware stack and serves it until
//! a shutdown signal arrives.
//!
//! Layer order, outermost first: panic recovery, request tracing, CORS
//! (only when origins are configured), admission control, authentication.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyHeader, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::coin_routes::{coin_routes, not_found};
use super::config::HttpServerConfig;
use super::errors::ApiError;
use super::health_routes::health_routes;
use super::state::AppState;
use crate::admission::Admission;
use crate::auth::authenticate;

/// HTTP server for the coin API
pub struct HttpServer {
    config: HttpServerConfig,
    admission: Admission,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState, admission: Admission) -> Self {
        let router = Self::build_router(&config, state, &admission);
        Self {
            config,
            admission,
            router,
        }
    }

    /// Build the combined router with all endpoints and layers
    pub fn build_router(config: &HttpServerConfig, state: AppState, admission: &Admission) -> Router {
        let authenticator = Arc::clone(&state.authenticator);

        let mut router = Router::new()
            .merge(health_routes())
            .merge(coin_routes())
            .fallback(not_found)
            .with_state(state)
            .layer(from_fn_with_state(authenticator, authenticate))
            .layer(admission.layer());

        if let Some(cors) = cors_layer(&config.cors_trusted_origins) {
            router = router.layer(cors);
        }

        router
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(handle_panic))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl+C or SIGTERM. The limiter sweeper runs for the
    /// lifetime of the server and is stopped before this returns.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {e}", self.config.socket_addr()),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(addr = %addr, env = %self.config.env, "starting server");

        let sweeper = self.admission.start_sweeper();

        let served = axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        if let Some(sweeper) = sweeper {
            sweeper.stop().await;
        }

        match &served {
            Ok(()) => info!(addr = %addr, "stopped server"),
            Err(e) => error!(error = %e, "server exited with error"),
        }
        served
    }
}

/// `None` when no origins are trusted: no CORS headers are emitted at all.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|s| s.parse().ok()).collect();
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(AnyHeader),
    )
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
