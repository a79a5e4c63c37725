//! nodeinit bootstrap daemon
//!
//! Entry point for field nodes looking for their owning organization.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nodeinit_bootstrap::{
    bootstrap_router, AppState, BootstrapConfig, LookupClient, MfgStatus, NmrClient, NodeResolver,
    Orchestrator,
};
use nodeinit_common::Database;
use nodeinit_lookup::{LookupService, SqliteStore};

#[derive(Parser)]
#[command(name = "bootstrapd")]
#[command(about = "nodeinit bootstrap service - node validation and org discovery")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "NODEINIT_BOOTSTRAP_CONFIG", default_value = "bootstrap.toml")]
    config: PathBuf,

    /// HTTP listen address
    #[arg(short, long, env = "NODEINIT_BOOTSTRAP_LISTEN")]
    listen: Option<String>,

    /// Manufacturing registry base URL
    #[arg(long, env = "NODEINIT_BOOTSTRAP_NMR_URL")]
    nmr_url: Option<String>,

    /// Lifecycle state a node must be in to bootstrap
    #[arg(long, env = "NODEINIT_BOOTSTRAP_READY_STATUS")]
    ready_status: Option<MfgStatus>,

    /// Lookup service base URL
    #[arg(long, env = "NODEINIT_BOOTSTRAP_LOOKUP_URL")]
    lookup_url: Option<String>,

    /// Resolve nodes from this lookup database instead of the lookup service
    #[arg(long, env = "NODEINIT_BOOTSTRAP_EMBEDDED_DB")]
    embedded_db: Option<PathBuf>,

    /// Request deadline in milliseconds
    #[arg(long, env = "NODEINIT_BOOTSTRAP_REQUEST_TIMEOUT_MS")]
    request_timeout_ms: Option<u64>,

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

    info!("nodeinit bootstrap v{}", nodeinit_common::VERSION);

    let mut config = BootstrapConfig::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(url) = cli.nmr_url {
        config.nmr.base_url = url;
    }
    if let Some(status) = cli.ready_status {
        config.nmr.ready_status = status;
    }
    if let Some(url) = cli.lookup_url {
        config.lookup.base_url = url;
    }
    if let Some(db) = cli.embedded_db {
        config.lookup.embedded_db = Some(db);
    }
    if let Some(ms) = cli.request_timeout_ms {
        config.request_timeout_ms = ms;
    }

    let validator = Arc::new(NmrClient::new(&config.nmr)?);
    info!(
        "Validating against NMR at {} (ready status '{}')",
        config.nmr.base_url, config.nmr.ready_status
    );

    let resolver: Arc<dyn NodeResolver> = match &config.lookup.embedded_db {
        Some(path) => {
            info!("Resolving nodes from embedded database {}", path.display());
            let db = Database::open(path)?;
            let service = Arc::new(LookupService::new(SqliteStore::new(db)?));
            Arc::new(service)
        }
        None => {
            info!("Resolving nodes via lookup service at {}", config.lookup.base_url);
            Arc::new(LookupClient::new(&config.lookup)?)
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(validator, resolver, config.request_timeout()));
    let shutdown = CancellationToken::new();
    let app = bootstrap_router(AppState::new(orchestrator, shutdown.clone()))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!("Bootstrap service listening on http://{}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
            shutdown.cancel();
        })
        .await?;

    info!("Bootstrap service shutdown complete");
    Ok(())
}
