//! nodeinit lookup daemon
//!
//! Serves organization credentials and node ownership to the bootstrap
//! service and to administrators.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nodeinit_common::Database;
use nodeinit_lookup::{lookup_router, LookupConfig, LookupService, SqliteStore};

#[derive(Parser)]
#[command(name = "lookupd")]
#[command(about = "nodeinit lookup service - node ownership and org credentials")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "NODEINIT_LOOKUP_CONFIG", default_value = "lookup.toml")]
    config: PathBuf,

    /// HTTP listen address
    #[arg(short, long, env = "NODEINIT_LOOKUP_LISTEN")]
    listen: Option<String>,

    /// Database path
    #[arg(long, env = "NODEINIT_LOOKUP_DB")]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    if cli.log_json {
        tracing_subscriber::registry().with(fmt::layer().json()).with(filter).init();
    } else {
        tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
    }

    info!("nodeinit lookup v{}", nodeinit_common::VERSION);

    let mut config = LookupConfig::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let db = Database::open(&config.db_path)?;
    let service = Arc::new(LookupService::new(SqliteStore::new(db)?));
    let app = lookup_router(service).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!("Lookup service listening on http://{}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Lookup service shutdown complete");
    Ok(())
}
