//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Stops calling `listener.accept()`, so no new connection is taken.
//! 2. Lets every in-flight connection finish its upload or delete.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! Upstream calls have no timeout of their own, so the platform's
//! termination grace period bounds how long draining can take.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::{Error, ProxyError};
use crate::request::Request;
use crate::handler::Handler;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds the listening socket. Port `0` picks a free port; read it back
    /// with [`local_addr`](Server::local_addr).
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until SIGTERM or Ctrl-C, then drains.
    ///
    /// Set the platform's termination grace period longer than the slowest
    /// upload you expect to forward; connections still open when it runs
    /// out are killed with the process.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains.
    ///
    /// Returns only once every in-flight connection has finished, so a
    /// caller that awaits this knows no upload is still being forwarded.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let addr = self.listener.local_addr()?;

        // One routing table, shared by every connection task.
        let router = Arc::new(router);

        // Every spawned connection task lands here so shutdown can wait on
        // all of them.
        let mut tasks = tokio::task::JoinSet::new();

        info!(%addr, "transfer-proxy listening");

        // `select!` polls the signal by reference on every iteration, and a
        // future must not move once it has been polled. `tokio::pin!` pins it
        // on the stack for the life of the loop.
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // `biased` polls the arms top to bottom instead of at random.
                // Shutdown sits first, so a signal stops accepting even while
                // connections are still queued on the listener.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    // Adapts tokio's AsyncRead/AsyncWrite to hyper's IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // The closure runs once per request on the connection,
                        // not once per connection.
                        let svc = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                            let router = Arc::clone(&router);
                            async move { dispatch(&router, req).await }
                        });

                        // `auto::Builder` speaks HTTP/1.1 or HTTP/2, whichever
                        // the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the set stays bounded on a
                // long-running server.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: nothing new is accepted, everything in flight completes.
        while tasks.join_next().await.is_some() {}

        info!("transfer-proxy stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers the body and hands the request to the router.
///
/// The error type is [`Infallible`](std::convert::Infallible): every failure
/// becomes an envelope, so hyper never sees an error. A body that cannot be
/// read is a transport fault and answers `500`, still passed through the
/// router's layers so it carries the same CORS headers as everything else.
async fn dispatch<B>(
    router: &Router,
    req: hyper::Request<B>,
) -> Result<http::Response<http_body_util::Full<Bytes>>, std::convert::Infallible>
where
    B: hyper::body::Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let (parts, body) = req.into_parts();
    let response = match body.collect().await {
        Ok(collected) => router.handle(Request::from_parts(parts, collected.to_bytes())).await,
        Err(e) => {
            warn!("failed to read request body: {e}");
            let message = format!("could not read request body: {e}");
            let endpoint = move |_req: Request| {
                let err = ProxyError::internal(message.clone());
                async move { err }
            };
            router.run(Request::from_parts(parts, Bytes::new()), endpoint.into_boxed_handler()).await
        }
    };
    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this is **SIGTERM** (what container orchestrators send before
/// SIGKILL) or **SIGINT** (Ctrl-C, for local runs). Elsewhere only Ctrl-C is
/// available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // Never resolves, which disables the SIGTERM arm off Unix.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use http::StatusCode;
    use hyper::body::Frame;
    use serde_json::{Value, json};

    use super::*;
    use crate::method::Method;
    use crate::middleware::Cors;

    /// A request body whose peer vanished mid-upload.
    struct ResetBody;

    impl hyper::body::Body for ResetBody {
        type Data = Bytes;
        type Error = io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))))
        }
    }

    #[tokio::test]
    async fn unreadable_body_is_internal_and_keeps_cors() {
        let router = Router::new()
            .on(Method::Post, "/upload", |_req: Request| async { "handled" })
            .layer(Cors::permissive());

        let req = hyper::Request::post("/upload").body(ResetBody).unwrap();
        let res = dispatch(&router, req).await.unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Internal server error",
                "message": "could not read request body: peer went away",
            })
        );
    }
}
