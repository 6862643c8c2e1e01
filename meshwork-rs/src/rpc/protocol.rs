//! RPC protocols: RpcError, RpcTransport.

use async_trait::async_trait;
use meshwork_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    /// No healthy instance could be resolved (none registered, lookup failed or timed out).
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    /// An instance was resolved but the call failed: non-2xx, connect error, timeout or undecodable body.
    #[error("remote call failed: {0}")]
    RemoteCallFailed(String),
}

impl From<RpcError> for CoreError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::DependencyUnavailable(_) => CoreError::Unavailable(e.to_string()),
            RpcError::RemoteCallFailed(_) => CoreError::BadGateway(e.to_string()),
        }
    }
}

/// RPC transport: fetch a URL from a resolved instance. Async so it does not block the runtime.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// GET `url`. Ok only for a 2xx answer, carrying the body.
    async fn get(&self, url: &str) -> Result<Vec<u8>, RpcError>;
}
