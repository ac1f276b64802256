use tracing::info;
use tracing_subscriber::EnvFilter;

use transfer_proxy::config::{self, ProxyConfig};
use transfer_proxy::{Error, Server, router};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = config::parse_args();
    let config = ProxyConfig::try_from(&args)?;

    info!(
        upstream = %config.upstream,
        mount_path = %config.mount_path,
        delete_mode = ?config.delete_mode,
        "starting transfer-proxy"
    );

    let app = router(config)?;
    Server::bind(args.bind).await?.serve(app).await
}
