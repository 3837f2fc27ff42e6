//! mango: single-user credential vault over HTTP.

use anyhow::Context;
use clap::Parser;
use mango_crypto::EncryptionKey;
use mango_server::cli::{Cli, Command};
use mango_server::config::{load_encryption_key, ServerConfig};
use mango_server::{build_engine, run, shutdown_signal, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "mango=info,mango_server=info,mango_vault=info,mango_storage=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command() {
        Command::Serve => serve().await,
        Command::Keygen => keygen(),
    }
}

fn keygen() -> anyhow::Result<()> {
    let key = EncryptionKey::generate().context("failed to generate encryption key")?;
    println!("{}", key.to_hex());
    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;
    let key = load_encryption_key(|var| std::env::var(var).ok())
        .context("failed to load encryption key")?;

    info!(
        db_path = %config.db_path.display(),
        collection = %config.collection,
        "opening credential store"
    );
    let vault = build_engine(&config, key).await?;
    info!(site_index = vault.has_site_index(), "vault ready");

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %listener.local_addr()?, "server listening");

    let state = AppState::new(Arc::new(vault), config.request_timeout());
    run(listener, state, config.shutdown_timeout(), shutdown_signal()).await?;

    info!("server stopped");
    Ok(())
}
