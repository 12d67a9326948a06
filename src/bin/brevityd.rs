//! brevityd: the Brevity daemon.
//!
//! Loads the summarization and sentiment models once and serves them over
//! HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use brevity::Brevity;
use brevity::server::config::Config;

/// Brevity daemon: summarization and sentiment over HTTP.
#[derive(Parser)]
#[command(name = "brevityd")]
#[command(version = brevity::PKG_VERSION)]
#[command(about = "Brevity summarization and sentiment daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind to, overriding the config file.
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let address = args.address.unwrap_or(config.server.address);
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| brevity::BrevityError::Configuration(format!("Invalid address: {e}")))?;

    info!(version = brevity::version_string(), %addr, "brevityd starting");

    // Model loading is blocking file and native-library work.
    let core = config.core;
    let brevity = tokio::task::spawn_blocking(move || Brevity::builder().config(core).build())
        .await??;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, brevity::server::router(Arc::new(brevity))).await?;

    Ok(())
}
