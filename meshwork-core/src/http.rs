//! Async HTTP server: tokio + hyper. Each connection runs on its own task and is dispatched into `App`.
//! `GET /health` is answered here without touching the router; registries poll it.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::{App, CoreError};

pub(crate) const HEALTH_PATH: &str = "health";
const HEALTH_BODY: &[u8] = br#"{"status":"UP"}"#;

/// Accept connections on `listener` until `shutdown` resolves.
/// In-flight connections are left to finish on their own tasks.
pub async fn serve<F>(app: Arc<App>, listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "listening");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(%local_addr, "listener stopped");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(x) => x,
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let app = Arc::clone(&app);
                tokio::task::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let app = Arc::clone(&app);
                        async move { Ok::<_, Infallible>(dispatch(app, req).await) }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(%peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }
}

async fn dispatch(app: Arc<App>, req: Request<hyper::body::Incoming>) -> Response<Full<Bytes>> {
    let method = req.method().to_string();
    let path = req.uri().path().trim_matches('/').to_string();

    if method == "GET" && path == HEALTH_PATH {
        return json_response(StatusCode::OK, Bytes::from_static(HEALTH_BODY));
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return error_response(&CoreError::Validation(e.to_string())),
    };

    match app.handle_request(&method, &path, &body).await {
        Ok(out) => json_response(StatusCode::OK, Bytes::from(out)),
        Err(e) => {
            if e.status_code() >= 500 {
                warn!(%method, %path, error = %e, "request failed");
            }
            error_response(&e)
        }
    }
}

fn json_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

fn error_response(e: &CoreError) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({ "error": e.to_string() });
    json_response(status, Bytes::from(body.to_string()))
}

/// Resolves on ctrl-c. If the signal handler cannot be installed the server keeps running.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
