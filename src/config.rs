//! Command-line and environment configuration.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::error::Error;

/// What `DELETE` does.
///
/// transfer.sh's support for deleting through the `X-Url-Delete` link has
/// not been consistent across deployments, so both behaviours are kept and
/// picked per deployment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum DeleteMode {
    /// Acknowledge the request and echo the URL back. No network call.
    Simulated,
    /// Forward a `DELETE` to the deletion URL.
    #[default]
    Real,
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to listen on.
    #[arg(long, env = "TRANSFER_PROXY_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Base URL of the transfer.sh instance uploads are sent to.
    #[arg(long, env = "TRANSFER_PROXY_UPSTREAM", default_value = "https://transfer.sh")]
    pub upstream: String,

    /// Path the proxy endpoint is served on.
    #[arg(long, env = "TRANSFER_PROXY_MOUNT_PATH", default_value = "/api/transfer")]
    pub mount_path: String,

    #[arg(long, env = "TRANSFER_PROXY_DELETE_MODE", value_enum, default_value_t = DeleteMode::Real)]
    pub delete_mode: DeleteMode,

    /// Ask transfer.sh to drop the file after this many downloads.
    #[arg(long, env = "TRANSFER_PROXY_MAX_DOWNLOADS")]
    pub max_downloads: Option<u32>,

    /// Ask transfer.sh to drop the file after this many days.
    #[arg(long, env = "TRANSFER_PROXY_MAX_DAYS")]
    pub max_days: Option<u32>,

    /// Value of `Access-Control-Allow-Origin`.
    #[arg(long, env = "TRANSFER_PROXY_ALLOW_ORIGIN", default_value = "*")]
    pub allow_origin: String,

    /// Whether to send `Access-Control-Allow-Credentials: true`.
    #[arg(
        long,
        env = "TRANSFER_PROXY_ALLOW_CREDENTIALS",
        default_value_t = true,
        action = clap::ArgAction::Set,
    )]
    pub allow_credentials: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

/// Advisory expiry headers passed through to transfer.sh. The collaborator
/// may ignore them; nothing here enforces them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExpiryHints {
    pub max_downloads: Option<u32>,
    pub max_days: Option<u32>,
}

/// Validated proxy configuration.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub upstream: Url,
    pub mount_path: String,
    pub delete_mode: DeleteMode,
    pub expiry: ExpiryHints,
    pub allow_origin: String,
    pub allow_credentials: bool,
}

impl ProxyConfig {
    /// Defaults for everything but the upstream.
    pub fn new(upstream: Url) -> Self {
        Self {
            upstream,
            mount_path: "/api/transfer".to_owned(),
            delete_mode: DeleteMode::default(),
            expiry: ExpiryHints::default(),
            allow_origin: "*".to_owned(),
            allow_credentials: true,
        }
    }

    pub fn with_mount_path(mut self, path: impl Into<String>) -> Self {
        self.mount_path = path.into();
        self
    }

    pub fn with_delete_mode(mut self, mode: DeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    pub fn with_expiry(mut self, expiry: ExpiryHints) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }
}

impl TryFrom<&Args> for ProxyConfig {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        if !args.mount_path.starts_with('/') {
            return Err(Error::Config(format!(
                "mount path `{}` must start with `/`",
                args.mount_path
            )));
        }
        Ok(Self {
            upstream: parse_upstream(&args.upstream)?,
            mount_path: args.mount_path.clone(),
            delete_mode: args.delete_mode,
            expiry: ExpiryHints { max_downloads: args.max_downloads, max_days: args.max_days },
            allow_origin: args.allow_origin.clone(),
            allow_credentials: args.allow_credentials,
        })
    }
}

fn parse_upstream(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("upstream `{raw}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!("upstream `{raw}`: unsupported scheme `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["transfer-proxy"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_point_at_transfer_sh() {
        let config = ProxyConfig::try_from(&args(&[])).unwrap();
        assert_eq!(config.upstream.as_str(), "https://transfer.sh/");
        assert_eq!(config.mount_path, "/api/transfer");
        assert_eq!(config.delete_mode, DeleteMode::Real);
        assert_eq!(config.expiry, ExpiryHints::default());
        assert_eq!(config.allow_origin, "*");
        assert!(config.allow_credentials);
    }

    #[test]
    fn flags_override_defaults() {
        let config = ProxyConfig::try_from(&args(&[
            "--delete-mode", "simulated",
            "--max-downloads", "1",
            "--max-days", "1",
            "--mount-path", "/.netlify/functions/transfer",
            "--allow-credentials", "false",
        ]))
        .unwrap();
        assert_eq!(config.delete_mode, DeleteMode::Simulated);
        assert_eq!(config.expiry, ExpiryHints { max_downloads: Some(1), max_days: Some(1) });
        assert_eq!(config.mount_path, "/.netlify/functions/transfer");
        assert!(!config.allow_credentials);
    }

    #[test]
    fn rejects_bad_upstream_and_mount_path() {
        assert!(ProxyConfig::try_from(&args(&["--upstream", "ftp://transfer.sh"])).is_err());
        assert!(ProxyConfig::try_from(&args(&["--upstream", "not a url"])).is_err());
        assert!(ProxyConfig::try_from(&args(&["--mount-path", "api"])).is_err());
    }
}
