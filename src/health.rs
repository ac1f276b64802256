//! Liveness and readiness probes.
//!
//! | Probe | Path | Answers |
//! |---|---|---|
//! | **Liveness** | `/healthz` | `200 ok` while the process can serve HTTP |
//! | **Readiness** | `/readyz` | `200 ready`; the proxy holds no connections to warm up |
//!
//! Neither probe calls transfer.sh. An unreachable collaborator shows up as
//! upstream errors on real requests, not as a pod being pulled from rotation.

use crate::{Request, Response};

pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
