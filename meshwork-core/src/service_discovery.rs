//! Service discovery contract: register an instance under a logical name, resolve healthy instances.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("registry unreachable: {0}")]
    Unreachable(String),
    #[error("registry rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed registry payload: {0}")]
    Malformed(String),
}

/// One running process registered under a logical name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub name: String,
    pub instance_id: String,
    /// `host:port` the instance serves HTTP on.
    pub address: String,
}

impl ServiceInstance {
    pub fn new(
        name: impl Into<String>,
        instance_id: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instance_id: instance_id.into(),
            address: address.into(),
        }
    }

    /// e.g. `http://10.0.0.5:8081`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Host (without IPv6 brackets) and port, or None when the address has no numeric port.
    pub fn host_port(&self) -> Option<(&str, u16)> {
        let (host, port) = self.address.rsplit_once(':')?;
        let port = port.parse().ok()?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return None;
        }
        Some((host, port))
    }
}

/// Registry collaborator. Implementations: static config, in-memory, Consul.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// Healthy instances currently registered under `service_name`. Empty when none.
    async fn resolve(&self, service_name: &str) -> Result<Vec<ServiceInstance>, DiscoveryError>;

    async fn register(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError>;

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError>;
}
