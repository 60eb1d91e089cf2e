use anyhow::Context;
use clap::Parser;
use korean_map_proxy::{
    config::ProxyConfig,
    handler::{build_router, serve},
};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "korean-map-proxy", version, about = "Kakao Local API reverse proxy")]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address (e.g. 127.0.0.1:8080)
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ProxyConfig::from_file(path),
        None => ProxyConfig::from_env(),
    }
    .inspect_err(|e| tracing::error!(error = %e, "Failed to load configuration"))?;

    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    config
        .validate()
        .inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?;

    tracing::info!(
        listen_addr = %config.server.listen_addr,
        upstream = %config.upstream.base_url,
        timeout_secs = config.upstream.timeout_secs,
        stream_error_events = config.upstream.stream_error_events,
        "Configuration loaded"
    );

    let router = build_router(&config)?;

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to bind listener"))
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;

    serve(listener, router).await?;
    Ok(())
}

fn init_logging() {
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
