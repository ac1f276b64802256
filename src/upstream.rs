//! Client for the transfer.sh collaborator.
//!
//! Exactly two calls: `PUT {base}/{fileName}` to store a file and
//! `DELETE {deletionUrl}` to drop it. No retries and no timeout of our own;
//! whatever reqwest and the platform impose applies.

use reqwest::{Client, header};
use tracing::{debug, warn};
use url::Url;

use crate::config::ExpiryHints;
use crate::error::{Error, ProxyError};
use crate::transfer::{TransferRequest, TransferResult};

/// Header transfer.sh uses to hand back the deletion link.
const DELETE_URL_HEADER: &str = "x-url-delete";

pub struct TransferClient {
    http: Client,
    base: Url,
}

impl TransferClient {
    pub fn new(base: Url) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(concat!("transfer-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    /// The URL a file named `file_name` is uploaded to. The name becomes a
    /// single percent-encoded path segment.
    pub fn upload_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            urlencoding::encode(file_name)
        )
    }

    pub async fn upload(
        &self,
        file: TransferRequest,
        expiry: ExpiryHints,
    ) -> Result<TransferResult, ProxyError> {
        let url = self.upload_url(&file.file_name);
        debug!(%url, bytes = file.content.len(), "uploading to transfer.sh");

        let mut request = self.http
            .put(&url)
            .header(header::CONTENT_TYPE, file.mime_type.as_str())
            .body(file.content);
        if let Some(n) = expiry.max_downloads {
            request = request.header("Max-Downloads", n.to_string());
        }
        if let Some(n) = expiry.max_days {
            request = request.header("Max-Days", n.to_string());
        }

        let response = request.send().await.map_err(internal)?;
        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.map_err(internal)?;
            warn!(%status, "transfer.sh rejected upload");
            return Err(ProxyError::Upstream {
                error: "Upload to transfer.sh failed",
                status,
                details,
            });
        }

        let deletion_url = response.headers()
            .get(DELETE_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let download_url = response.text().await.map_err(internal)?.trim().to_owned();

        Ok(TransferResult::new(download_url, deletion_url))
    }

    pub async fn delete(&self, url: Url) -> Result<(), ProxyError> {
        debug!(%url, "deleting from transfer.sh");

        let response = self.http.delete(url).send().await.map_err(internal)?;
        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.map_err(internal)?;
            warn!(%status, "transfer.sh rejected deletion");
            return Err(ProxyError::Upstream {
                error: "Deletion from transfer.sh failed",
                status,
                details,
            });
        }
        Ok(())
    }
}

fn internal(e: reqwest::Error) -> ProxyError {
    ProxyError::internal(e.to_string())
}
