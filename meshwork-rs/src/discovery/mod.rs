//! Discovery: registry adapters and DiscoveryModule.

mod consul;
mod memory;
mod static_discovery;

pub use consul::ConsulDiscovery;
pub use memory::InMemoryRegistry;
pub use static_discovery::StaticDiscovery;

use std::sync::Arc;

use meshwork_core::{CoreError, ServiceDiscovery};

use crate::core::{Application, Module};

/// Discovery as object: one adapter (static, in-memory, Consul or custom).
/// Register via app.register(discovery). Available on Application via .discovery().
pub struct DiscoveryModule {
    adapter: Option<Arc<dyn ServiceDiscovery>>,
}

impl DiscoveryModule {
    pub fn new() -> Self {
        Self { adapter: None }
    }

    /// Use custom implementation.
    pub fn adapter(mut self, impl_: impl ServiceDiscovery + 'static) -> Self {
        self.adapter = Some(Arc::new(impl_));
        self
    }

    /// Use an adapter that is also held elsewhere (e.g. a registry shared between apps in one process).
    pub fn shared(mut self, adapter: Arc<dyn ServiceDiscovery>) -> Self {
        self.adapter = Some(adapter);
        self
    }
}

impl Default for DiscoveryModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for DiscoveryModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        let adapter = self
            .adapter
            .take()
            .unwrap_or_else(|| Arc::new(StaticDiscovery::default()) as Arc<dyn ServiceDiscovery>);
        app.set_discovery(adapter);
        Ok(())
    }
}
