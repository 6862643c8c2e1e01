//! Service configuration: command-line arguments with environment fallbacks (arguments override env).

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, ValueEnum};
use meshwork_core::ServiceDiscovery;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::Registration;
use crate::discovery::{ConsulDiscovery, DiscoveryModule, StaticDiscovery};
use crate::rpc::{HttpTransport, RpcClient};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RegistryKind {
    /// Consul agent HTTP API.
    Consul,
    /// Fixed `--static-service` entries; nothing is registered.
    Static,
}

/// Settings shared by every meshwork service binary. Flatten into the binary's own parser.
#[derive(Args, Clone, Debug)]
pub struct ServiceArgs {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Instance identifier used in logs and registration [default: <service>-<port>].
    #[arg(long, env = "INSTANCE_ID")]
    pub instance_id: Option<String>,

    /// Host advertised to the registry [default: the bound IP].
    #[arg(long, env = "ADVERTISE_HOST")]
    pub advertise_host: Option<String>,

    #[arg(long, env = "REGISTRY", value_enum, default_value_t = RegistryKind::Consul)]
    pub registry: RegistryKind,

    /// Consul agent address.
    #[arg(long, env = "REGISTRY_ADDR", default_value = "127.0.0.1:8500")]
    pub registry_addr: String,

    /// Static registry entry, repeatable.
    #[arg(long = "static-service", value_name = "NAME=HOST:PORT", value_parser = parse_static_service)]
    pub static_services: Vec<(String, String)>,

    /// Timeout for each registry request and each outbound call, in milliseconds.
    #[arg(long, env = "CALL_TIMEOUT_MS", default_value_t = 5000)]
    pub call_timeout_ms: u64,
}

impl ServiceArgs {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn instance_id(&self, service_name: &str, port: u16) -> String {
        self.instance_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", service_name, port))
    }

    pub fn registration(&self, service_name: &str, port: u16) -> Registration {
        let reg = Registration::new(service_name, self.instance_id(service_name, port));
        match &self.advertise_host {
            Some(host) => reg.advertise_host(host.clone()),
            None => reg,
        }
    }

    pub fn discovery(&self) -> Arc<dyn ServiceDiscovery> {
        match self.registry {
            RegistryKind::Consul => {
                Arc::new(ConsulDiscovery::new(&self.registry_addr, self.call_timeout()))
            }
            RegistryKind::Static => {
                let pairs: Vec<(&str, &str)> = self
                    .static_services
                    .iter()
                    .map(|(n, a)| (n.as_str(), a.as_str()))
                    .collect();
                Arc::new(StaticDiscovery::from_slice(&pairs))
            }
        }
    }

    pub fn discovery_module(&self) -> DiscoveryModule {
        DiscoveryModule::new().shared(self.discovery())
    }

    /// Discovery-backed client with both the lookup and the call bounded by `call_timeout`.
    pub fn rpc_client(&self, discovery: Arc<dyn ServiceDiscovery>) -> RpcClient {
        RpcClient::new(discovery, Arc::new(HttpTransport::new(self.call_timeout())))
            .with_lookup_timeout(self.call_timeout())
    }
}

/// Parses `NAME=HOST:PORT`.
pub fn parse_static_service(s: &str) -> Result<(String, String), String> {
    let (name, address) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=HOST:PORT, got {:?}", s))?;
    let (name, address) = (name.trim(), address.trim());
    let has_port = matches!(
        address.rsplit_once(':'),
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok()
    );
    if name.is_empty() || !has_port {
        return Err(format!("expected NAME=HOST:PORT, got {:?}", s));
    }
    Ok((name.to_string(), address.to_string()))
}

/// Install the fmt subscriber; filter from RUST_LOG, `info` when unset.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
