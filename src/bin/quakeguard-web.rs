// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! QuakeGuard Web Dashboard
//!
//! Standalone web server for the QuakeGuard dashboard interface.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use quakeguard::catalog::CatalogClient;
use quakeguard::config::AppConfig;
use quakeguard::Result;

#[derive(Parser, Debug)]
#[command(name = "quakeguard-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "QuakeGuard Web Dashboard Server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the catalog endpoint
    #[arg(long)]
    catalog_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("QuakeGuard Web Dashboard v{}", env!("CARGO_PKG_VERSION"));

    // Load config
    let mut config = AppConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if let Some(url) = args.catalog_url {
        config.catalog.url = url;
    }

    let client = CatalogClient::new(&config.catalog)?;
    info!("Catalog: {}", client.url());

    let addr = format!("{}:{}", config.web.host, config.web.port);
    info!("Starting web server at http://{}", addr);

    quakeguard::web::start_server(config, Box::new(client)).await
}

