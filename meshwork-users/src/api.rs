//! The GetUsers capability and its discovery-backed implementation.

use std::sync::Arc;

use async_trait::async_trait;
use meshwork_rs::{RpcClient, RpcError};

use crate::USERS_PATH;

#[async_trait]
pub trait UsersApi: Send + Sync {
    async fn get_users(&self) -> Result<Vec<String>, RpcError>;
}

/// Resolves `service_name` on every call and GETs `/users` from one healthy instance.
pub struct DiscoveredUsers {
    service_name: String,
    rpc: RpcClient,
}

#[async_trait]
impl UsersApi for DiscoveredUsers {
    async fn get_users(&self) -> Result<Vec<String>, RpcError> {
        self.rpc.get_json(&self.service_name, USERS_PATH).await
    }
}

/// Client for the users roster served by whatever is registered under `service_name`.
pub fn users_client(service_name: &str, rpc: RpcClient) -> Arc<dyn UsersApi> {
    Arc::new(DiscoveredUsers {
        service_name: service_name.to_string(),
        rpc,
    })
}
