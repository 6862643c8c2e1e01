//! Discovery from static config (name -> addresses). Nothing to register with.

use std::collections::HashMap;

use async_trait::async_trait;
use meshwork_core::{DiscoveryError, ServiceDiscovery, ServiceInstance};
use tracing::debug;

/// Every configured address counts as a healthy instance.
#[derive(Clone, Debug, Default)]
pub struct StaticDiscovery {
    services: HashMap<String, Vec<String>>,
}

impl StaticDiscovery {
    /// Build from (name, address) pairs; a name may repeat.
    pub fn from_slice(pairs: &[(&str, &str)]) -> Self {
        let mut services: HashMap<String, Vec<String>> = HashMap::new();
        for (name, address) in pairs {
            services
                .entry((*name).to_string())
                .or_default()
                .push((*address).to_string());
        }
        Self { services }
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn resolve(&self, service_name: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        Ok(self
            .services
            .get(service_name)
            .map(|addresses| {
                addresses
                    .iter()
                    .map(|a| ServiceInstance::new(service_name, format!("{}@{}", service_name, a), a.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn register(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError> {
        debug!(instance_id = %instance.instance_id, "static discovery: registration skipped");
        Ok(())
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError> {
        debug!(instance_id = %instance.instance_id, "static discovery: deregistration skipped");
        Ok(())
    }
}
