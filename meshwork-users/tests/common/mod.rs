#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use meshwork_rs::{
    Application, DiscoveryModule, HttpTransport, InMemoryRegistry, Registration, RpcClient,
};
use meshwork_users::{backend_module, front_module, users_client, BACKEND_SERVICE, FRONT_SERVICE};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A served app; dropping it stops the listener.
pub struct Running {
    pub addr: SocketAddr,
    _stop: oneshot::Sender<()>,
}

impl Running {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }
}

pub async fn start(app: Application) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let bound = app.start(listener).await.unwrap();
    let addr = bound.local_addr();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(bound.serve(async {
        let _ = rx.await;
    }));
    Running { addr, _stop: tx }
}

pub fn rpc_client(registry: &InMemoryRegistry) -> RpcClient {
    RpcClient::new(
        Arc::new(registry.clone()),
        Arc::new(HttpTransport::new(Duration::from_secs(5))),
    )
}

pub fn backend_app(registry: &InMemoryRegistry, instance_id: &str) -> Application {
    let mut app = Application::new();
    app.register(&mut DiscoveryModule::new().adapter(registry.clone()))
        .unwrap();
    app.register(&mut backend_module(instance_id)).unwrap();
    app.register_as(Registration::new(BACKEND_SERVICE, instance_id));
    app
}

pub fn front_app(registry: &InMemoryRegistry, instance_id: &str) -> Application {
    let mut app = Application::new();
    app.register(&mut DiscoveryModule::new().adapter(registry.clone()))
        .unwrap();
    let users = users_client(BACKEND_SERVICE, rpc_client(registry));
    app.register(&mut front_module(instance_id, users)).unwrap();
    app.register_as(Registration::new(FRONT_SERVICE, instance_id));
    app
}
