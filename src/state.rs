use crate::registry::Registry;
use crate::relay::{spawn_relay, RelayConfig, RelayHandle};

/// Shared application state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    /// Producer side of the broadcast relay queue
    pub relay: RelayHandle,
}

impl AppState {
    pub fn new(registry: Registry, relay: RelayHandle) -> Self {
        Self { registry, relay }
    }

    /// Build a fresh registry and start its relay worker.
    /// Must be called from within a tokio runtime.
    pub fn start(config: RelayConfig) -> Self {
        let registry = Registry::new();
        let relay = spawn_relay(registry.clone(), config);
        Self::new(registry, relay)
    }
}
