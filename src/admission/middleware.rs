//! # Admission Middleware
//!
//! A tower layer that asks the [`RateLimiterRegistry`] before handing a
//! request to the wrapped service. Denied requests get a 429 and never
//! reach the inner service.
//!
//! The client key comes from the connection's peer address, or from a
//! configured header when the service sits behind a proxy.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};
use tracing::{debug, error};

use super::config::LimiterConfig;
use super::errors::{AdmissionError, AdmissionResult};
use super::registry::{ClientKey, RateLimiterRegistry};
use super::sweeper::SweeperHandle;
use crate::http_server::errors::ApiError;

/// Admission control built from [`LimiterConfig`].
///
/// When the limiter is disabled no registry exists and the layer passes
/// every request straight through.
#[derive(Debug, Clone)]
pub struct Admission {
    registry: Option<Arc<RateLimiterRegistry>>,
    client_ip_header: Option<HeaderName>,
    config: LimiterConfig,
}

impl Admission {
    pub fn from_config(config: &LimiterConfig) -> AdmissionResult<Self> {
        config.validate()?;

        let client_ip_header = match &config.client_ip_header {
            Some(name) => Some(
                name.parse::<HeaderName>()
                    .map_err(|e| AdmissionError::InvalidConfig(e.to_string()))?,
            ),
            None => None,
        };

        let registry = config
            .enabled
            .then(|| Arc::new(RateLimiterRegistry::new(config.rps, config.burst)));

        Ok(Self {
            registry,
            client_ip_header,
            config: config.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.registry.is_some()
    }

    pub fn registry(&self) -> Option<&Arc<RateLimiterRegistry>> {
        self.registry.as_ref()
    }

    pub fn layer(&self) -> AdmissionLayer {
        AdmissionLayer {
            registry: self.registry.clone(),
            client_ip_header: self.client_ip_header.clone(),
        }
    }

    /// Starts idle-client eviction. Returns `None` when the limiter is
    /// disabled. Must be called from within a tokio runtime.
    pub fn start_sweeper(&self) -> Option<SweeperHandle> {
        self.registry.as_ref().map(|registry| {
            SweeperHandle::spawn(
                Arc::clone(registry),
                self.config.sweep_period(),
                self.config.idle_threshold(),
            )
        })
    }
}

/// Layer applying admission control to an axum service.
#[derive(Debug, Clone)]
pub struct AdmissionLayer {
    registry: Option<Arc<RateLimiterRegistry>>,
    client_ip_header: Option<HeaderName>,
}

impl<S> Layer<S> for AdmissionLayer {
    type Service = AdmissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService {
            inner,
            registry: self.registry.clone(),
            client_ip_header: self.client_ip_header.clone(),
        }
    }
}

/// Service produced by [`AdmissionLayer`].
#[derive(Debug, Clone)]
pub struct AdmissionService<S> {
    inner: S,
    registry: Option<Arc<RateLimiterRegistry>>,
    client_ip_header: Option<HeaderName>,
}

impl<S> AdmissionService<S> {
    fn client_key(&self, req: &Request) -> AdmissionResult<ClientKey> {
        if let Some(header) = &self.client_ip_header {
            let raw = req
                .headers()
                .get(header)
                .ok_or(AdmissionError::MissingClientAddress)?
                .to_str()
                .map_err(|_| AdmissionError::MalformedClientAddress("<non-ascii>".to_string()))?;
            // Proxies append; the left-most entry is the original client.
            let first = raw.split(',').next().unwrap_or(raw);
            return ClientKey::parse(first);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| ClientKey::from(*addr))
            .ok_or(AdmissionError::MissingClientAddress)
    }
}

impl<S> Service<Request> for AdmissionService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // The clone may not be ready; keep the one poll_ready drove.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let Some(registry) = self.registry.clone() else {
            return Box::pin(inner.call(req));
        };

        let key = match self.client_key(&req) {
            Ok(key) => key,
            Err(e) => {
                error!(error = %e, "cannot derive client key for admission");
                return Box::pin(async move { Ok(ApiError::Internal(e.to_string()).into_response()) });
            }
        };

        if !registry.admit(&key) {
            debug!(client = %key, "request denied by rate limiter");
            return Box::pin(async move { Ok(ApiError::RateLimitExceeded.into_response()) });
        }

        Box::pin(inner.call(req))
    }
}
