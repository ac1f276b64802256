//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Layers registered with
//! [`Router::layer`] wrap every request, matched or not.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use matchit::Router as MatchitRouter;

use crate::error::ProxyError;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{Layer, LayerStack, Next};
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    layers: LayerStack,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Arc::new(Vec::new()) }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for the same method. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.insert(method, path, handler.into_boxed_handler());
        self
    }

    /// Register one handler for every known method on `path`.
    pub fn any(mut self, path: &str, handler: impl Handler) -> Self {
        let handler = handler.into_boxed_handler();
        for method in Method::ALL {
            self.insert(method, path, Arc::clone(&handler));
        }
        self
    }

    /// Add a layer. The first layer added is the outermost one.
    pub fn layer(mut self, layer: impl Layer) -> Self {
        Arc::make_mut(&mut self.layers).push(Arc::new(layer));
        self
    }

    /// Routes one request through the layer chain and produces one response.
    pub async fn handle(&self, mut req: Request) -> Response {
        let endpoint = match req.method() {
            Some(method) => match self.lookup(method, req.path()) {
                Some((handler, params)) => {
                    req.params = params;
                    handler
                }
                None => not_found.into_boxed_handler(),
            },
            None => method_not_allowed.into_boxed_handler(),
        };
        self.run(req, endpoint).await
    }

    /// Runs the layer chain around a specific endpoint, bypassing routing.
    pub(crate) async fn run(&self, req: Request, endpoint: BoxedHandler) -> Response {
        Next::new(Arc::clone(&self.layers), endpoint).run(req).await
    }

    fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
    }

    fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_req: Request) -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "Not found" }))).into_response()
}

async fn method_not_allowed(_req: Request) -> ProxyError {
    ProxyError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Next;

    async fn echo_id(req: Request) -> String {
        req.param("id").unwrap_or("none").to_owned()
    }

    async fn tag(req: Request, next: Next) -> Response {
        let mut res = next.run(req).await;
        let seen = res.header("x-tag").map(|v| format!("{v},outer")).unwrap_or_else(|| "outer".into());
        res.set_header("x-tag", &seen);
        res
    }

    async fn inner_tag(req: Request, next: Next) -> Response {
        let mut res = next.run(req).await;
        res.set_header("x-tag", "inner");
        res
    }

    #[tokio::test]
    async fn matches_params_per_method() {
        let app = Router::new().on(Method::Get, "/files/{id}", echo_id);

        let res = app.handle(Request::new("GET", "/files/42")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"42");

        let res = app.handle(Request::new("POST", "/files/42")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn any_covers_every_known_method() {
        let app = Router::new().any("/files/{id}", echo_id);
        for method in Method::ALL {
            let res = app.handle(Request::new(method.as_str(), "/files/7")).await;
            assert_eq!(res.body(), b"7", "{method}");
        }
    }

    #[tokio::test]
    async fn unknown_method_is_405_json() {
        let app = Router::new().any("/", echo_id);
        let res = app.handle(Request::new("BREW", "/")).await;
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.body(), br#"{"error":"Method not allowed"}"#);
    }

    #[tokio::test]
    async fn first_layer_is_outermost() {
        let app = Router::new()
            .on(Method::Get, "/", echo_id)
            .layer(tag)
            .layer(inner_tag);
        let res = app.handle(Request::new("GET", "/")).await;
        assert_eq!(res.header("x-tag"), Some("inner,outer"));
    }
}
