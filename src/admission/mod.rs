//! # Admission Control
//!
//! Per-client rate limiting in front of the HTTP handlers:
//! - `bucket`: continuous-refill token bucket
//! - `registry`: one bucket per client, lazily created, swept when idle
//! - `sweeper`: background task that evicts idle clients
//! - `middleware`: tower layer that turns a denial into a 429

pub mod bucket;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod registry;
pub mod sweeper;

pub use bucket::TokenBucket;
pub use config::LimiterConfig;
pub use errors::{AdmissionError, AdmissionResult};
pub use middleware::{Admission, AdmissionLayer, AdmissionService};
pub use registry::{ClientKey, RateLimiterRegistry};
pub use sweeper::SweeperHandle;
