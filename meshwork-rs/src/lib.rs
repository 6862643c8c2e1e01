//! Meshwork Rust facade: Application, Module trait, discovery adapters and RPC client on meshwork-core.

pub mod config;
pub mod core;
pub mod discovery;
pub mod rpc;

pub use config::{init_tracing, RegistryKind, ServiceArgs};
pub use core::{
    Application, BoundApplication, Handler, HandlerFuture, HttpModule, Module, Registration,
    StartupError,
};
pub use discovery::{ConsulDiscovery, DiscoveryModule, InMemoryRegistry, StaticDiscovery};
pub use meshwork_core::{CoreError, DiscoveryError, ServiceDiscovery, ServiceInstance};
pub use rpc::{HttpTransport, RpcClient, RpcError, RpcTransport};
