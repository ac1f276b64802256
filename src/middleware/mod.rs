//! Middleware layer.
//!
//! A layer is a function from `(Request, Next)` to a response. It sees every
//! request the router handles, including the ones that end in `404` or
//! `405`, and may short-circuit or decorate what the rest of the chain
//! returns:
//!
//! ```rust,no_run
//! use transfer_proxy::{Request, Router};
//! use transfer_proxy::middleware::Next;
//!
//! async fn stamp(req: Request, next: Next) -> transfer_proxy::Response {
//!     let mut res = next.run(req).await;
//!     res.set_header("x-served-by", "transfer-proxy");
//!     res
//! }
//!
//! let app = Router::new().layer(stamp);
//! ```
//!
//! Built-in layers:
//! - [`Cors`]: one place that stamps CORS headers on every response
//! - [`trace`]: per-request event with method, path, status, latency

mod cors;
mod trace;

pub use cors::Cors;
pub use trace::trace;
pub use crate::handler::BoxFuture;

use std::future::Future;
use std::sync::Arc;

use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;

/// A middleware function. Implemented for every
/// `Fn(Request, Next) -> impl Future<Output = Response>`.
pub trait Layer: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

impl<F, Fut> Layer for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self)(req, next))
    }
}

pub(crate) type LayerStack = Arc<Vec<Arc<dyn Layer>>>;

/// The remainder of the chain: the layers after the current one, then the
/// endpoint handler.
pub struct Next {
    layers: LayerStack,
    index: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(layers: LayerStack, endpoint: BoxedHandler) -> Self {
        Self { layers, index: 0, endpoint }
    }

    /// Runs the rest of the chain.
    pub async fn run(self, req: Request) -> Response {
        match self.layers.get(self.index).cloned() {
            Some(layer) => {
                let next = Self { index: self.index + 1, ..self };
                layer.call(req, next).await
            }
            None => self.endpoint.call(req).await,
        }
    }
}
