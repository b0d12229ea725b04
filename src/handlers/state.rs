//! Shared application state
//!
//! The readiness registry plus the effective configuration. The registry is
//! the only mutable piece, and its mutation is the loader's write-once
//! publication - handlers only ever read.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::registry::ModelRegistry;

pub struct ServiceState {
    registry: Arc<ModelRegistry>,
    config: ServerConfig,
    started_at: Instant,
}

impl ServiceState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(ModelRegistry::new()),
            config,
            started_at: Instant::now(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Shared handle for the background loader.
    pub fn registry_handle(&self) -> Arc<ModelRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
