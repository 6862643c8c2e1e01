//! Application: registers routes with core, dispatches to Rust handlers and owns the
//! registration lifecycle (bind → register → serve → deregister).

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use meshwork_core::{App, CoreError, ResponseFuture, RouteId, ServiceDiscovery, ServiceInstance};

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, CoreError>> + Send>>;

/// Handler: receives the JSON body (Null when empty), returns JSON value or error.
pub type Handler = Box<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// How this process appears in the registry.
#[derive(Clone, Debug)]
pub struct Registration {
    /// Logical name dependents resolve, e.g. "service2".
    pub service_name: String,
    pub instance_id: String,
    /// Host advertised to the registry. Defaults to the listener's IP.
    pub advertise_host: Option<String>,
}

impl Registration {
    pub fn new(service_name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            instance_id: instance_id.into(),
            advertise_host: None,
        }
    }

    pub fn advertise_host(mut self, host: impl Into<String>) -> Self {
        self.advertise_host = Some(host.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("registration of {instance_id} as {service_name} failed: {reason}")]
    RegistrationFailed {
        service_name: String,
        instance_id: String,
        reason: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application: routes and handlers, optional service discovery, optional registration.
pub struct Application {
    pub(crate) core: App,
    pub(crate) handlers: HashMap<RouteId, Handler>,
    pub(crate) callback_installed: bool,
    /// Set by DiscoveryModule.
    pub(crate) discovery: Option<Arc<dyn ServiceDiscovery>>,
    pub(crate) registration: Option<Registration>,
}

impl Application {
    pub fn new() -> Self {
        Self {
            core: App::new(),
            handlers: HashMap::new(),
            callback_installed: false,
            discovery: None,
            registration: None,
        }
    }

    pub fn set_discovery(&mut self, adapter: Arc<dyn ServiceDiscovery>) {
        self.discovery = Some(adapter);
    }

    pub fn discovery(&self) -> Option<Arc<dyn ServiceDiscovery>> {
        self.discovery.clone()
    }

    /// Register this process with the discovery adapter when it starts.
    pub fn register_as(&mut self, registration: Registration) -> &mut Self {
        self.registration = Some(registration);
        self
    }

    /// Register a route and handler. Path e.g. "users".
    pub fn register_route(
        &mut self,
        method: &str,
        path: &str,
        handler: Handler,
    ) -> Result<RouteId, CoreError> {
        let id = self.core.register_route(method, path)?;
        self.handlers.insert(id, handler);
        Ok(id)
    }

    /// Register a module (routes, discovery adapter).
    pub fn register(&mut self, module: &mut dyn crate::core::Module) -> Result<(), CoreError> {
        module.register_into(self)
    }

    pub(crate) fn install_callback(&mut self) {
        if self.callback_installed {
            return;
        }
        self.callback_installed = true;
        let handlers = Arc::new(std::mem::take(&mut self.handlers));
        self.core.set_callback(Box::new(move |route_id: RouteId, body: &[u8]| -> ResponseFuture {
            let handlers = Arc::clone(&handlers);
            let body = body.to_vec();
            Box::pin(async move {
                let value: Value = if body.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_slice(&body)
                        .map_err(|e| CoreError::Validation(e.to_string()))?
                };
                let handler = handlers
                    .get(&route_id)
                    .ok_or_else(|| CoreError::NotFound(format!("route_id {:?}", route_id)))?;
                let result = handler(value).await?;
                serde_json::to_vec(&result).map_err(CoreError::from)
            })
        }));
    }

    /// Handle one request without a listener (tests). Routes must be registered before the first call.
    pub async fn handle_request(
        &mut self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<Vec<u8>, CoreError> {
        self.install_callback();
        self.core.handle_request(method, path, body).await
    }

    /// Register with discovery (when configured) and return the bound app, ready to serve.
    /// A failed registration closes the listener: the process never serves unregistered.
    pub async fn start(mut self, listener: TcpListener) -> Result<BoundApplication, StartupError> {
        self.install_callback();
        let local_addr = listener.local_addr()?;

        let registered = match self.registration.take() {
            None => None,
            Some(reg) => {
                let discovery = self.discovery.clone().ok_or_else(|| {
                    StartupError::RegistrationFailed {
                        service_name: reg.service_name.clone(),
                        instance_id: reg.instance_id.clone(),
                        reason: "no service discovery configured".into(),
                    }
                })?;
                let instance = ServiceInstance::new(
                    reg.service_name,
                    reg.instance_id,
                    advertised_address(reg.advertise_host.as_deref(), local_addr),
                );
                discovery.register(&instance).await.map_err(|e| {
                    StartupError::RegistrationFailed {
                        service_name: instance.name.clone(),
                        instance_id: instance.instance_id.clone(),
                        reason: e.to_string(),
                    }
                })?;
                info!(
                    service = %instance.name,
                    instance_id = %instance.instance_id,
                    address = %instance.address,
                    "registered with service discovery"
                );
                Some((discovery, instance))
            }
        };

        Ok(BoundApplication {
            core: Arc::new(self.core),
            listener,
            local_addr,
            registered,
        })
    }

    /// Bind, register and serve until ctrl-c (blocks).
    pub fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = format!("{}:{}", host, port);
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        rt.block_on(async move {
            let listener = TcpListener::bind(&addr)
                .await
                .map_err(|source| StartupError::Bind {
                    addr: addr.clone(),
                    source,
                })?;
            let bound = self.start(listener).await?;
            bound.serve(meshwork_core::shutdown_signal()).await?;
            Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
        })
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

/// Application with a bound listener and, when configured, a live registration.
pub struct BoundApplication {
    core: Arc<App>,
    listener: TcpListener,
    local_addr: SocketAddr,
    registered: Option<(Arc<dyn ServiceDiscovery>, ServiceInstance)>,
}

impl BoundApplication {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The registry record for this process, if it registered.
    pub fn instance(&self) -> Option<&ServiceInstance> {
        self.registered.as_ref().map(|(_, instance)| instance)
    }

    /// Serve until `shutdown` resolves, then deregister.
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let result = meshwork_core::serve(self.core, self.listener, shutdown).await;
        if let Some((discovery, instance)) = self.registered {
            match discovery.deregister(&instance).await {
                Ok(()) => info!(instance_id = %instance.instance_id, "deregistered"),
                Err(e) => warn!(
                    instance_id = %instance.instance_id,
                    error = %e,
                    "deregistration failed; the registry health check will expire the instance"
                ),
            }
        }
        result
    }
}

fn advertised_address(advertise_host: Option<&str>, local_addr: SocketAddr) -> String {
    let host = match advertise_host {
        Some(h) => h.to_string(),
        None if local_addr.ip().is_unspecified() => {
            warn!(%local_addr, "listener bound to an unspecified address; advertising loopback");
            let loopback = if local_addr.is_ipv6() { "::1" } else { "127.0.0.1" };
            loopback.to_string()
        }
        None => local_addr.ip().to_string(),
    };
    if host.contains(':') {
        format!("[{}]:{}", host, local_addr.port())
    } else {
        format!("{}:{}", host, local_addr.port())
    }
}
