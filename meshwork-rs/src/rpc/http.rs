//! HTTP transport over the core pooled client.

use std::time::Duration;

use async_trait::async_trait;
use meshwork_core::HttpClient;

use super::protocol::{RpcError, RpcTransport};

pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    /// `timeout` bounds each call end to end.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(timeout),
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, RpcError> {
        let resp = self
            .client
            .get(url)
            .await
            .map_err(|e| RpcError::RemoteCallFailed(e.to_string()))?;
        if !resp.is_success() {
            return Err(RpcError::RemoteCallFailed(format!(
                "{} answered {}",
                url, resp.status
            )));
        }
        Ok(resp.body.to_vec())
    }
}
