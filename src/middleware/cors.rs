use crate::handler::BoxFuture;
use crate::request::Request;

use super::{Layer, Next};

const DEFAULT_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const DEFAULT_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
    Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// CORS headers applied to every response that passes through the router.
///
/// Preflight requests are not answered here; the endpoint decides what an
/// `OPTIONS` means and this layer only stamps the headers. Headers already
/// present with the same name are replaced, so a handler cannot leak a
/// conflicting policy.
#[derive(Clone, Debug)]
pub struct Cors {
    allow_origin: String,
    allow_methods: String,
    allow_headers: String,
    allow_credentials: bool,
}

impl Cors {
    /// The permissive policy the browser upload widget relies on.
    pub fn permissive() -> Self {
        Self {
            allow_origin: "*".to_owned(),
            allow_methods: DEFAULT_METHODS.to_owned(),
            allow_headers: DEFAULT_HEADERS.to_owned(),
            allow_credentials: true,
        }
    }

    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = origin.into();
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// The header pairs this policy emits.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Access-Control-Allow-Origin", self.allow_origin.clone()),
            ("Access-Control-Allow-Methods", self.allow_methods.clone()),
            ("Access-Control-Allow-Headers", self.allow_headers.clone()),
        ];
        if self.allow_credentials {
            headers.push(("Access-Control-Allow-Credentials", "true".to_owned()));
        }
        headers
    }
}

impl Default for Cors {
    fn default() -> Self { Self::permissive() }
}

impl Layer for Cors {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let headers = self.headers();
        Box::pin(async move {
            let mut res = next.run(req).await;
            for (name, value) in &headers {
                res.set_header(name, value);
            }
            res
        })
    }
}
