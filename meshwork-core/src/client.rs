//! Pooled HTTP/1 client with a per-request deadline covering connect, response head and body.

use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid request to {url:?}: {message}")]
    InvalidRequest { url: String, message: String },
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Status and fully-read body of a response.
#[derive(Clone, Debug)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ClientResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Clone)]
pub struct HttpClient {
    inner: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    pub async fn get(&self, url: &str) -> Result<ClientResponse, ClientError> {
        self.send(Method::GET, url, None).await
    }

    pub async fn put_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<ClientResponse, ClientError> {
        self.send(Method::PUT, url, Some(body.to_string().into_bytes()))
            .await
    }

    /// Send one request. A JSON content type is set when a body is given.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ClientResponse, ClientError> {
        let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| {
            ClientError::InvalidRequest {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Full::new(body.map(Bytes::from).unwrap_or_default()))
            .map_err(|e| ClientError::InvalidRequest {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let exchange = async {
            let resp = self
                .inner
                .request(req)
                .await
                .map_err(|e| transport_error(url, &e))?;
            let status = resp.status();
            let body = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| transport_error(url, &e))?
                .to_bytes();
            Ok::<_, ClientError>(ClientResponse { status, body })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

/// hyper errors carry the useful part (e.g. "Connection refused") in their source chain.
fn transport_error(url: &str, e: &(dyn std::error::Error + 'static)) -> ClientError {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(": ");
        message.push_str(&s.to_string());
        source = s.source();
    }
    ClientError::Transport {
        url: url.to_string(),
        message,
    }
}
