//! Shared application state for the HTTP handlers.

use std::sync::Arc;
use std::time::Duration;

use bioref_store::ReferenceStore;

use crate::config::ServerConfig;

/// State shared by every handler: the reference store plus the server
/// configuration.
///
/// Generic over the store implementation so tests can drop in mocks.
pub struct AppState<S: ReferenceStore> {
    store: Arc<S>,
    config: Arc<ServerConfig>,
}

// Manual Clone: `#[derive(Clone)]` would require `S: Clone`, but only the
// Arcs are cloned.
impl<S: ReferenceStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: ReferenceStore> AppState<S> {
    /// Creates state from a store and configuration.
    pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// The reference store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Per-lookup timeout for the composite search fan-out.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.config.lookup_timeout)
    }
}
