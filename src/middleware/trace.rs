use std::time::Instant;

use tracing::info;

use crate::request::Request;
use crate::response::Response;

use super::Next;

/// Logs one event per request once the response is known.
pub async fn trace(req: Request, next: Next) -> Response {
    let method = req.method_str().to_owned();
    let path = req.path().to_owned();
    let started = Instant::now();

    let res = next.run(req).await;

    info!(
        %method,
        %path,
        status = res.status_code().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    res
}
