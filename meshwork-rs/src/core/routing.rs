//! HttpModule: route module by prefix.

use std::future::Future;
use std::sync::Arc;

use meshwork_core::CoreError;
use serde_json::Value;

use super::app::{Application, HandlerFuture};
use super::{Handler, Module};

type RouteFn = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// HTTP module: routes under a prefix. Attach via app.register(module).
pub struct HttpModule {
    pub prefix: String,
    routes: Vec<(String, RouteFn, String)>,
}

impl HttpModule {
    /// Prefix defaults to `/{name}`; pass `Some("/")` to mount at the root.
    pub fn new(name: &str, prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string).unwrap_or_else(|| format!("/{}", name)),
            routes: Vec::new(),
        }
    }

    /// Add a route. path without leading slash is under the module prefix.
    /// methods e.g. ["GET"], ["GET", "PUT"].
    pub fn route<F, Fut>(mut self, path: &str, handler: F, methods: &[&str]) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CoreError>> + Send + 'static,
    {
        let full_path = format!(
            "{}/{}",
            self.prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let arc: RouteFn = Arc::new(move |v: Value| -> HandlerFuture { Box::pin(handler(v)) });
        for method in methods {
            self.routes
                .push((full_path.clone(), arc.clone(), method.to_string()));
        }
        self
    }

    pub fn paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|(path, _, method)| (method.as_str(), path.as_str()))
    }
}

impl Module for HttpModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        for (path, arc, method) in self.routes.drain(..) {
            let handler: Handler = Box::new(move |v| arc(v));
            app.register_route(&method, &path, handler)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_joins_paths() {
        let root = HttpModule::new("users", Some("/"))
            .route("users", |_| async { Ok(Value::Null) }, &["GET"]);
        assert_eq!(root.paths().collect::<Vec<_>>(), vec![("GET", "/users")]);

        let nested = HttpModule::new("admin", None)
            .route("/health", |_| async { Ok(Value::Null) }, &["GET", "PUT"]);
        assert_eq!(
            nested.paths().collect::<Vec<_>>(),
            vec![("GET", "/admin/health"), ("PUT", "/admin/health")]
        );
    }
}
