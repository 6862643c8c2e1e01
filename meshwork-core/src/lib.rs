//! Meshwork core: routing, request handling, HTTP server and client, service discovery contract.

pub mod client;
pub mod http;
pub mod router;
pub mod service_discovery;

pub use client::{ClientError, ClientResponse, HttpClient};
pub use http::{serve, shutdown_signal};
pub use router::{RouteId, Router};
pub use service_discovery::{DiscoveryError, ServiceDiscovery, ServiceInstance};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("route not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status the server answers with when a handler fails with this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::NotFound(_) => 404,
            CoreError::Validation(_) | CoreError::Json(_) => 400,
            CoreError::Unavailable(_) => 503,
            CoreError::BadGateway(_) => 502,
            CoreError::Internal(_) => 500,
        }
    }
}

/// Future returned by the request callback: response body bytes or a status-bearing error.
pub type ResponseFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, CoreError>> + Send>>;

/// Request handler callback: (route_id, body bytes) -> response bytes.
/// The facade implements this and dispatches to its per-route handlers.
pub type RequestCallback = Box<dyn Fn(RouteId, &[u8]) -> ResponseFuture + Send + Sync>;

/// Core app: routes and the callback that serves them.
pub struct App {
    pub router: Router,
    next_route_id: u32,
    callback: Option<RequestCallback>,
}

impl App {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            next_route_id: 0,
            callback: None,
        }
    }

    /// Register a route. Path is exact (e.g. "users"). Registering the same method and path twice is an error,
    /// and so is `GET /health`: the server answers it before routing.
    pub fn register_route(&mut self, method: &str, path: &str) -> Result<RouteId, CoreError> {
        let path = path.trim_matches('/');
        if method.eq_ignore_ascii_case("GET") && path == crate::http::HEALTH_PATH {
            return Err(CoreError::Validation(format!(
                "GET /{} is served by the server itself",
                path
            )));
        }
        if self.router.match_route(method, path).is_some() {
            return Err(CoreError::Validation(format!(
                "route already registered: {} /{}",
                method.to_uppercase(),
                path
            )));
        }
        let id = RouteId(self.next_route_id);
        self.next_route_id += 1;
        self.router.add(method, path, id);
        Ok(id)
    }

    pub fn set_callback(&mut self, cb: RequestCallback) {
        self.callback = Some(cb);
    }

    /// Handle a request without HTTP: match route, call callback. Used by tests and by the HTTP layer.
    pub async fn handle_request(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<Vec<u8>, CoreError> {
        let route_id = self
            .router
            .match_route(method, path)
            .ok_or_else(|| CoreError::NotFound(format!("{} /{}", method, path.trim_matches('/'))))?;
        let cb = self
            .callback
            .as_ref()
            .ok_or_else(|| CoreError::Internal("no callback set".into()))?;
        debug!(route = route_id.0, method, path, "dispatching request");
        cb(route_id, body).await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
