//! Shared handler state.

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::store::CoinStore;

use super::config::Environment;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: CoinStore,
    pub authenticator: Arc<dyn Authenticator>,
    pub env: Environment,
}

impl AppState {
    pub fn new(store: CoinStore, authenticator: Arc<dyn Authenticator>, env: Environment) -> Self {
        Self {
            store,
            authenticator,
            env,
        }
    }
}
