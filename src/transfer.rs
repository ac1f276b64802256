//! Wire types for the upload and delete endpoints.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{DecodeError, Engine as _, alphabet};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProxyError;
use crate::request::Request;

/// Field names of the upload body, in the order they are reported.
pub const UPLOAD_FIELDS: [&str; 3] = ["fileName", "mimeType", "fileContent"];

// Browser and CLI clients send padded, unpadded, line-wrapped and URL-safe
// payloads alike. Padding and stray trailing bits are both tolerated.
const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadBody {
    file_name: Option<String>,
    mime_type: Option<String>,
    file_content: Option<String>,
}

/// A validated upload with its payload already decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl TransferRequest {
    /// Parses and validates `{ fileName, mimeType, fileContent }`.
    ///
    /// An empty body is treated as `{}` so it reports every field as missing.
    /// Missing, `null` and empty strings all count as missing. A payload that
    /// no base64 alphabet decodes is an internal failure rather than a
    /// validation one.
    pub fn from_json(body: &[u8]) -> Result<Self, ProxyError> {
        let raw: UploadBody = if body.iter().all(u8::is_ascii_whitespace) {
            UploadBody::default()
        } else {
            serde_json::from_slice(body).map_err(|e| ProxyError::Validation {
                error: "Invalid JSON body",
                message: Some(e.to_string()),
                required: None,
                missing: None,
            })?
        };

        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        let (file_name, mime_type, encoded) = match (
            present(raw.file_name),
            present(raw.mime_type),
            present(raw.file_content),
        ) {
            (Some(name), Some(mime), Some(content)) => (name, mime, content),
            (name, mime, content) => {
                let missing = UPLOAD_FIELDS.iter()
                    .zip([name.is_none(), mime.is_none(), content.is_none()])
                    .filter_map(|(field, absent)| absent.then_some(*field))
                    .collect();
                return Err(ProxyError::Validation {
                    error: "Missing required fields",
                    message: None,
                    required: Some(UPLOAD_FIELDS.to_vec()),
                    missing: Some(missing),
                });
            }
        };

        let content = decode_payload(&encoded)
            .map_err(|e| ProxyError::internal(format!("fileContent is not valid base64: {e}")))?;

        Ok(Self { file_name, mime_type, content })
    }
}

/// Decodes `fileContent` with the standard alphabet, falling back to the
/// URL-safe one. ASCII whitespace anywhere in the payload is ignored. The
/// error reported is the standard alphabet's.
fn decode_payload(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD_LENIENT
        .decode(&compact)
        .or_else(|e| URL_SAFE_LENIENT.decode(&compact).map_err(|_| e))
}

/// What a successful upload returns to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub success: bool,
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_url: Option<String>,
}

impl TransferResult {
    pub fn new(download_url: String, deletion_url: Option<String>) -> Self {
        Self { success: true, download_url, deletion_url }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBody {
    deletion_url: Option<String>,
}

/// The URL a `DELETE` request names: `?url=` first, then a JSON body field
/// `deletionUrl`. `None` when neither is present and non-empty.
pub fn delete_target(req: &Request) -> Option<String> {
    if let Some(url) = req.query("url").filter(|u| !u.is_empty()) {
        return Some(url);
    }
    serde_json::from_slice::<DeleteBody>(req.body())
        .ok()
        .and_then(|b| b.deletion_url)
        .filter(|u| !u.is_empty())
}

/// Parses a deletion URL, accepting only absolute `http`/`https` URLs.
pub fn parse_deletion_url(raw: &str) -> Result<Url, ProxyError> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(ProxyError::validation("Invalid deletion URL")),
    }
}
