//! coinvault - JSON API for a rare coin catalogue
//!
//! - `coin`: the versioned record and its validation
//! - `store`: record storage with version-checked updates and paged listing
//! - `admission`: per-client token-bucket rate limiting
//! - `auth`: static bearer tokens and permission checks
//! - `http_server`: routes, middleware stack, error envelope
//! - `observability`: logging setup
//! - `cli`: configuration and process entry

pub mod admission;
pub mod auth;
pub mod cli;
pub mod coin;
pub mod http_server;
pub mod observability;
pub mod store;
