//! # transfer-proxy
//!
//! A small HTTP service that lets browsers upload files to transfer.sh and
//! delete them again, without talking to transfer.sh directly.
//!
//! One endpoint, dispatched by method:
//!
//! | Method | Does |
//! |---|---|
//! | `OPTIONS` | CORS preflight: `200`, empty body |
//! | `GET` | usage description |
//! | `POST` / `PUT` | `{ fileName, mimeType, fileContent }` → `PUT` to transfer.sh → `{ success, downloadUrl, deletionUrl? }` |
//! | `DELETE` | `?url=` or `{ deletionUrl }` → `DELETE` upstream (or a simulated acknowledgement) |
//! | anything else | `405 { "error": "Method not allowed" }` |
//!
//! Every failure is a JSON envelope `{ error, details?, message?, required?, missing? }`
//! and every response, failures included, carries the CORS headers.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use transfer_proxy::{ProxyConfig, Server, router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), transfer_proxy::Error> {
//!     let config = ProxyConfig::new("https://transfer.sh".parse().unwrap());
//!     let app = router(config)?;
//!
//!     Server::bind("0.0.0.0:3000".parse().unwrap()).await?.serve(app).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod transfer;
pub mod upstream;

pub use config::{DeleteMode, ExpiryHints, ProxyConfig};
pub use error::{Error, ProxyError};
pub use handler::Handler;
pub use method::Method;
pub use proxy::{UploadProxy, router};
pub use request::Request;
pub use response::{IntoResponse, Json, Response};
pub use router::Router;
pub use server::Server;
