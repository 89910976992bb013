//! # Field Clearer Server
//!
//! An admin service for selectively clearing a field — or a field nested
//! inside repeatable/dynamic-zone components — on a single CMS document,
//! without deleting the document or touching sibling data.
//!
//! The server exposes three routes (`/field-clearer/config`,
//! `/field-clearer/preview-field`, `/field-clearer/clear-field`) and talks
//! to the document store over its JSON-RPC endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod classify;
mod clear;
mod components;
mod config;
mod constants;
mod error;
mod fetch;
mod field_path;
mod http_api;
mod json_access;
mod preview;
mod service;
mod store;

use config::Config;
use http_api::AppState;
use service::FieldClearer;
use store::HttpDocumentStore;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "field-clearer-server", about, version)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "field-clearer.json")]
    config: PathBuf,

    /// Override the listen address from the configuration file
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("field_clearer_server=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config).map_err(|report| anyhow::anyhow!("{report}"))?;
    let listen = args.listen.unwrap_or_else(|| config.listen.clone());

    let store = HttpDocumentStore::new(config.store_url.clone(), config.store_token.clone());
    let state = Arc::new(AppState {
        clearer: FieldClearer::new(store),
        config,
    });

    let router = http_api::router(state);
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("cannot bind {listen}"))?;
    info!("field-clearer listening on {listen}");
    axum::serve(listener, router).await?;
    Ok(())
}
