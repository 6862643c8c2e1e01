//! In-process registry: shared map of registrations with a passing flag per instance.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use meshwork_core::{DiscoveryError, ServiceDiscovery, ServiceInstance};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Clone, Debug)]
struct Entry {
    instance: ServiceInstance,
    passing: bool,
}

/// Clones share state, so several apps in one process (or a test) see the same registry.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    services: Arc<RwLock<HashMap<String, Vec<Entry>>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the health of a registered instance. Returns false when the instance is unknown.
    pub async fn set_passing(&self, instance_id: &str, passing: bool) -> bool {
        let mut services = self.services.write().await;
        for entries in services.values_mut() {
            if let Some(e) = entries
                .iter_mut()
                .find(|e| e.instance.instance_id == instance_id)
            {
                e.passing = passing;
                return true;
            }
        }
        false
    }

    /// Every registration under `service_name`, healthy or not.
    pub async fn instances(&self, service_name: &str) -> Vec<ServiceInstance> {
        self.services
            .read()
            .await
            .get(service_name)
            .map(|entries| entries.iter().map(|e| e.instance.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ServiceDiscovery for InMemoryRegistry {
    async fn resolve(&self, service_name: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        Ok(self
            .services
            .read()
            .await
            .get(service_name)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.passing)
                    .map(|e| e.instance.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Re-registering an instance id replaces the previous record.
    async fn register(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError> {
        let mut services = self.services.write().await;
        for entries in services.values_mut() {
            entries.retain(|e| e.instance.instance_id != instance.instance_id);
        }
        services
            .entry(instance.name.clone())
            .or_default()
            .push(Entry {
                instance: instance.clone(),
                passing: true,
            });
        debug!(service = %instance.name, instance_id = %instance.instance_id, "registered in memory");
        Ok(())
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError> {
        let mut services = self.services.write().await;
        if let Some(entries) = services.get_mut(&instance.name) {
            entries.retain(|e| e.instance.instance_id != instance.instance_id);
            if entries.is_empty() {
                services.remove(&instance.name);
            }
        }
        Ok(())
    }
}
