//! The authenticated identity attached to each request.

use std::collections::BTreeSet;

use super::errors::{AuthError, AuthResult};

/// Permission to list and fetch coins
pub const COINS_READ: &str = "coins:read";

/// Permission to create, update and delete coins
pub const COINS_WRITE: &str = "coins:write";

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    /// No credentials presented
    #[default]
    Anonymous,

    /// Caller presented a known token
    User {
        name: String,
        permissions: BTreeSet<String>,
    },
}

impl Principal {
    pub fn user<I, P>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Principal::User {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::User { name, .. } => Some(name),
        }
    }

    /// Fails closed: anonymous callers are asked to authenticate, known
    /// callers without the code are refused.
    pub fn require_permission(&self, code: &str) -> AuthResult<()> {
        match self {
            Principal::Anonymous => Err(AuthError::AuthenticationRequired),
            Principal::User { permissions, .. } if permissions.contains(code) => Ok(()),
            Principal::User { .. } => Err(AuthError::NotPermitted),
        }
    }
}
