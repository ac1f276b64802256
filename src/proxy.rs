//! The upload proxy endpoint.
//!
//! One request in, at most one call out to transfer.sh, one JSON envelope
//! back. Dispatch is by method and happens once:
//!
//! ```text
//! OPTIONS     → preflight, 200 with an empty body
//! GET         → usage description
//! POST | PUT  → upload
//! DELETE      → delete (simulated or real, per configuration)
//! otherwise   → 405
//! ```
//!
//! The proxy holds only immutable configuration and a shared HTTP client;
//! concurrent requests never observe each other.

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::{DeleteMode, ProxyConfig};
use crate::error::{Error, ProxyError};
use crate::health;
use crate::method::Method;
use crate::middleware::{self, Cors};
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::transfer::{self, TransferRequest, TransferResult};
use crate::upstream::TransferClient;

pub struct UploadProxy {
    client: TransferClient,
    config: ProxyConfig,
}

#[derive(Serialize)]
struct Acknowledgement<'a> {
    success: bool,
    message: &'a str,
    #[serde(rename = "deletedUrl", skip_serializing_if = "Option::is_none")]
    deleted_url: Option<&'a str>,
}

impl UploadProxy {
    pub fn new(config: ProxyConfig) -> Result<Self, Error> {
        let client = TransferClient::new(config.upstream.clone())?;
        Ok(Self { client, config })
    }

    /// Handles one request. Every outcome, including failures, is a response.
    pub async fn handle(&self, req: Request) -> Response {
        match req.method() {
            Some(Method::Options) => self.handle_preflight(),
            Some(Method::Get) => self.handle_status(),
            Some(Method::Post | Method::Put) => self.handle_upload(req).await.into_response(),
            Some(Method::Delete) => self.handle_delete(req).await.into_response(),
            _ => self.handle_unsupported_method(),
        }
    }

    /// CORS preflight. The CORS layer adds the headers.
    pub fn handle_preflight(&self) -> Response {
        Response::status(StatusCode::OK)
    }

    /// Describes how to call the endpoint. No side effects.
    pub fn handle_status(&self) -> Response {
        let path = &self.config.mount_path;
        let upload = format!("{path} {{fileName, mimeType, fileContent (base64)}}");
        let delete = match self.config.delete_mode {
            DeleteMode::Simulated => format!("{path}?url=<download_url> (simulated)"),
            DeleteMode::Real => format!("{path}?url=<deletion_url> or {{deletionUrl}}"),
        };
        Json(json!({
            "message": "Transfer.sh proxy is live",
            "usage": {
                "POST": upload,
                "PUT": upload,
                "DELETE": delete,
            },
        }))
        .into_response()
    }

    pub async fn handle_upload(&self, req: Request) -> Result<Json<TransferResult>, ProxyError> {
        let file = TransferRequest::from_json(req.body()).inspect_err(log_failure)?;
        let name = file.file_name.clone();

        let result = self.client
            .upload(file, self.config.expiry)
            .await
            .inspect_err(log_failure)?;

        info!(file = %name, url = %result.download_url, "upload stored");
        Ok(Json(result))
    }

    pub async fn handle_delete(&self, req: Request) -> Result<Response, ProxyError> {
        match self.config.delete_mode {
            DeleteMode::Simulated => {
                let url = req.query("url").filter(|u| !u.is_empty()).ok_or_else(|| {
                    ProxyError::validation("Missing 'url' query param for deletion")
                })?;
                info!(%url, "simulated deletion");
                Ok(Json(Acknowledgement {
                    success: true,
                    message: "Simulated deletion. transfer.sh does not support real DELETE.",
                    deleted_url: Some(url.as_str()),
                })
                .into_response())
            }
            DeleteMode::Real => {
                let raw = transfer::delete_target(&req).ok_or_else(|| ProxyError::Validation {
                    error: "Missing required field",
                    message: None,
                    required: Some(vec!["deletionUrl"]),
                    missing: None,
                })?;
                let url = transfer::parse_deletion_url(&raw)?;
                self.client.delete(url).await.inspect_err(log_failure)?;
                info!(url = %raw, "deleted");
                Ok(Json(Acknowledgement {
                    success: true,
                    message: "File deleted successfully",
                    deleted_url: None,
                })
                .into_response())
            }
        }
    }

    pub fn handle_unsupported_method(&self) -> Response {
        ProxyError::MethodNotAllowed.into_response()
    }
}

fn log_failure(err: &ProxyError) {
    match err {
        ProxyError::Internal { .. } => error!("{err}"),
        _ => warn!("{err}"),
    }
}

/// The full application: the proxy on every method at the mount path,
/// health probes, request tracing, and CORS on every response.
pub fn router(config: ProxyConfig) -> Result<Router, Error> {
    let cors = Cors::permissive()
        .allow_origin(config.allow_origin.clone())
        .allow_credentials(config.allow_credentials);
    let mount_path = config.mount_path.clone();
    let proxy = Arc::new(UploadProxy::new(config)?);

    let endpoint = move |req: Request| {
        let proxy = Arc::clone(&proxy);
        async move { proxy.handle(req).await }
    };

    Ok(Router::new()
        .any(&mount_path, endpoint)
        .on(Method::Get, "/healthz", health::liveness)
        .on(Method::Get, "/readyz", health::readiness)
        .layer(cors)
        .layer(middleware::trace))
}
