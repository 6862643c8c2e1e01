//! Consul agent HTTP API adapter.

use std::time::Duration;

use async_trait::async_trait;
use meshwork_core::{ClientResponse, DiscoveryError, HttpClient, ServiceDiscovery, ServiceInstance};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const CHECK_INTERVAL: &str = "10s";
const CHECK_TIMEOUT: &str = "5s";
const DEREGISTER_CRITICAL_AFTER: &str = "1m";

/// Registers with the local Consul agent and resolves through its health endpoint,
/// so only instances whose checks pass are returned.
pub struct ConsulDiscovery {
    base_url: String,
    http: HttpClient,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: NodeInfo,
    service: AgentService,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeInfo {
    #[serde(default)]
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AgentService {
    #[serde(rename = "ID")]
    id: String,
    service: String,
    #[serde(default)]
    address: String,
    port: u16,
}

impl ConsulDiscovery {
    /// `agent` is `host:port` or a full base URL of the Consul agent.
    pub fn new(agent: &str, timeout: Duration) -> Self {
        let agent = agent.trim_end_matches('/');
        let base_url = if agent.starts_with("http://") || agent.starts_with("https://") {
            agent.to_string()
        } else {
            format!("http://{}", agent)
        };
        Self {
            base_url,
            http: HttpClient::new(timeout),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }
}

/// Agent registration body; the check polls the instance's `/health`.
fn registration_payload(instance: &ServiceInstance) -> Result<Value, DiscoveryError> {
    let (host, port) = instance.host_port().ok_or_else(|| {
        DiscoveryError::Malformed(format!(
            "address {:?} of {} has no host:port",
            instance.address, instance.instance_id
        ))
    })?;
    Ok(json!({
        "ID": instance.instance_id,
        "Name": instance.name,
        "Address": host,
        "Port": port,
        "Check": {
            "HTTP": format!("{}/health", instance.base_url()),
            "Interval": CHECK_INTERVAL,
            "Timeout": CHECK_TIMEOUT,
            "DeregisterCriticalServiceAfter": DEREGISTER_CRITICAL_AFTER,
        }
    }))
}

/// Instances from a `/v1/health/service/<name>` answer. An empty service address means "same as the node".
fn instances_from_health(body: &[u8]) -> Result<Vec<ServiceInstance>, DiscoveryError> {
    let entries: Vec<HealthEntry> =
        serde_json::from_slice(body).map_err(|e| DiscoveryError::Malformed(e.to_string()))?;
    Ok(entries
        .into_iter()
        .map(|e| {
            let host = if e.service.address.is_empty() {
                e.node.address
            } else {
                e.service.address
            };
            let address = if host.contains(':') {
                format!("[{}]:{}", host, e.service.port)
            } else {
                format!("{}:{}", host, e.service.port)
            };
            ServiceInstance::new(e.service.service, e.service.id, address)
        })
        .collect())
}

fn expect_success(resp: ClientResponse) -> Result<ClientResponse, DiscoveryError> {
    if resp.is_success() {
        Ok(resp)
    } else {
        Err(DiscoveryError::Rejected {
            status: resp.status.as_u16(),
            message: String::from_utf8_lossy(&resp.body).trim().to_string(),
        })
    }
}

#[async_trait]
impl ServiceDiscovery for ConsulDiscovery {
    async fn resolve(&self, service_name: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        let url = self.url(&format!("/health/service/{}?passing=true", service_name));
        let resp = self
            .http
            .get(&url)
            .await
            .map_err(|e| DiscoveryError::Unreachable(e.to_string()))?;
        let instances = instances_from_health(&expect_success(resp)?.body)?;
        debug!(service = service_name, count = instances.len(), "consul lookup");
        Ok(instances)
    }

    async fn register(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError> {
        let payload = registration_payload(instance)?;
        let resp = self
            .http
            .put_json(&self.url("/agent/service/register"), &payload)
            .await
            .map_err(|e| DiscoveryError::Unreachable(e.to_string()))?;
        expect_success(resp).map(|_| ())
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError> {
        let url = self.url(&format!("/agent/service/deregister/{}", instance.instance_id));
        let resp = self
            .http
            .put_json(&url, &Value::Null)
            .await
            .map_err(|e| DiscoveryError::Unreachable(e.to_string()))?;
        expect_success(resp).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_a_scheme() {
        let d = ConsulDiscovery::new("127.0.0.1:8500/", Duration::from_secs(1));
        assert_eq!(d.base_url(), "http://127.0.0.1:8500");
        assert_eq!(d.url("/agent/self"), "http://127.0.0.1:8500/v1/agent/self");

        let tls = ConsulDiscovery::new("https://consul.service:8501", Duration::from_secs(1));
        assert_eq!(tls.base_url(), "https://consul.service:8501");
    }

    #[test]
    fn registration_payload_carries_health_check() {
        let me = ServiceInstance::new("service2", "service2-8081", "10.0.0.5:8081");
        let p = registration_payload(&me).unwrap();
        assert_eq!(p["ID"], "service2-8081");
        assert_eq!(p["Name"], "service2");
        assert_eq!(p["Address"], "10.0.0.5");
        assert_eq!(p["Port"], 8081);
        assert_eq!(p["Check"]["HTTP"], "http://10.0.0.5:8081/health");
        assert_eq!(p["Check"]["DeregisterCriticalServiceAfter"], "1m");

        let bad = ServiceInstance::new("service2", "x", "nowhere");
        assert!(matches!(registration_payload(&bad), Err(DiscoveryError::Malformed(_))));
    }

    #[test]
    fn health_entries_fall_back_to_node_address() {
        let body = br#"[
            {"Node": {"Node": "n1", "Address": "10.0.0.7"},
             "Service": {"ID": "service2-a", "Service": "service2", "Address": "", "Port": 8081},
             "Checks": []},
            {"Node": {"Node": "n2", "Address": "10.0.0.8"},
             "Service": {"ID": "service2-b", "Service": "service2", "Address": "172.17.0.3", "Port": 9000},
             "Checks": []}
        ]"#;
        let found = instances_from_health(body).unwrap();
        assert_eq!(
            found,
            vec![
                ServiceInstance::new("service2", "service2-a", "10.0.0.7:8081"),
                ServiceInstance::new("service2", "service2-b", "172.17.0.3:9000"),
            ]
        );
        assert!(instances_from_health(b"[]").unwrap().is_empty());
        assert!(matches!(instances_from_health(b"{}"), Err(DiscoveryError::Malformed(_))));
    }
}
