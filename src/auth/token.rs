//! Bearer token authentication.
//!
//! Tokens are held as SHA-256 digests; the raw token is never stored past
//! construction.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};

use super::config::AuthConfig;
use super::errors::{AuthError, AuthResult};
use super::principal::Principal;

/// Maps request headers to a [`Principal`].
pub trait Authenticator: Send + Sync {
    /// No `Authorization` header means [`Principal::Anonymous`]. A header
    /// that is present but unusable is an error, never anonymous.
    fn authenticate(&self, headers: &HeaderMap) -> AuthResult<Principal>;
}

type TokenDigest = [u8; 32];

fn digest(token: &str) -> TokenDigest {
    Sha256::digest(token.as_bytes()).into()
}

/// Authenticator over a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    principals: HashMap<TokenDigest, Principal>,
}

impl StaticTokenAuthenticator {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        config.validate()?;

        let principals = config
            .tokens
            .iter()
            .map(|grant| {
                (
                    digest(&grant.token),
                    Principal::user(grant.user.clone(), grant.permissions.iter().cloned()),
                )
            })
            .collect();

        Ok(Self { principals })
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> AuthResult<Principal> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(Principal::Anonymous);
        };

        let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
        let token = match value.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => return Err(AuthError::InvalidToken),
        };
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        self.principals
            .get(&digest(token))
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
