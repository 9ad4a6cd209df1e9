//! Auth Configuration
//!
//! Static API tokens and the permissions each one grants.

use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};

/// A single configured token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenGrant {
    /// Raw bearer token; only its digest is kept at runtime
    pub token: String,

    /// Name the token authenticates as
    pub user: String,

    /// Permission codes, e.g. `coins:read`
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Auth configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<TokenGrant>,
}

impl AuthConfig {
    pub fn validate(&self) -> AuthResult<()> {
        for (i, grant) in self.tokens.iter().enumerate() {
            if grant.token.trim().is_empty() {
                return Err(AuthError::InvalidConfig(format!("tokens[{i}].token is empty")));
            }
            // Presented tokens are trimmed, so a padded one could never match.
            if grant.token.trim() != grant.token {
                return Err(AuthError::InvalidConfig(format!(
                    "tokens[{i}].token has leading or trailing whitespace"
                )));
            }
            if grant.user.trim().is_empty() {
                return Err(AuthError::InvalidConfig(format!("tokens[{i}].user is empty")));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for grant in &self.tokens {
            if !seen.insert(grant.token.as_str()) {
                return Err(AuthError::InvalidConfig(format!(
                    "token for user {:?} is configured more than once",
                    grant.user
                )));
            }
        }
        Ok(())
    }
}
