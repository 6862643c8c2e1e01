//! RPC: discovery-backed client. Resolve a logical name, pick an instance, call it.

mod http;
mod protocol;

pub use http::HttpTransport;
pub use protocol::{RpcError, RpcTransport};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use meshwork_core::{ServiceDiscovery, ServiceInstance};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Registry lookups slower than this count as "dependency unavailable".
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Client: resolves the service on every call and rotates round-robin over the healthy instances
/// the lookup returned. No retries.
pub struct RpcClient {
    discovery: Arc<dyn ServiceDiscovery>,
    transport: Arc<dyn RpcTransport>,
    lookup_timeout: Duration,
    next: AtomicUsize,
}

impl RpcClient {
    pub fn new(discovery: Arc<dyn ServiceDiscovery>, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            discovery,
            transport,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            next: AtomicUsize::new(0),
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Resolve `service_name` and select one healthy instance.
    pub async fn pick(&self, service_name: &str) -> Result<ServiceInstance, RpcError> {
        let lookup = tokio::time::timeout(self.lookup_timeout, self.discovery.resolve(service_name))
            .await
            .map_err(|_| {
                RpcError::DependencyUnavailable(format!(
                    "lookup of {:?} timed out after {:?}",
                    service_name, self.lookup_timeout
                ))
            })?;
        let mut instances = lookup.map_err(|e| {
            RpcError::DependencyUnavailable(format!("lookup of {:?} failed: {}", service_name, e))
        })?;
        if instances.is_empty() {
            return Err(RpcError::DependencyUnavailable(format!(
                "no healthy instance of {:?}",
                service_name
            )));
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % instances.len();
        Ok(instances.swap_remove(idx))
    }

    /// GET `path` on one instance of `service_name` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        service_name: &str,
        path: &str,
    ) -> Result<T, RpcError> {
        let instance = self.pick(service_name).await?;
        let url = format!("{}/{}", instance.base_url(), path.trim_start_matches('/'));
        debug!(service = service_name, instance_id = %instance.instance_id, %url, "calling");
        let bytes = self.transport.get(&url).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            RpcError::RemoteCallFailed(format!("{}: undecodable response: {}", url, e))
        })
    }
}
