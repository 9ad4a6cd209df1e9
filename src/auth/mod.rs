//! # Auth Module
//!
//! Minimal authentication collaborator for the coin API: static bearer
//! tokens mapped to a [`Principal`] with a set of permission codes.
//! Permission checks fail closed.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod principal;
pub mod token;

pub use config::{AuthConfig, TokenGrant};
pub use errors::{AuthError, AuthResult};
pub use middleware::authenticate;
pub use principal::{Principal, COINS_READ, COINS_WRITE};
pub use token::{Authenticator, StaticTokenAuthenticator};
