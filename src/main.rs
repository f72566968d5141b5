use clap::Parser;
use dhcp_pxe::{Args, DhcpServer, ServerConfig};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ServerConfig::from(args);

    let server = DhcpServer::new(config).map_err(|e| {
        tracing::error!("Failed to start server: {}", e);
        e
    })?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
    }

    Ok(())
}
