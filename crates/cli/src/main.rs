//! nodeinit CLI - Main Entry Point

use clap::{Parser, Subcommand};
use std::time::Duration;

mod client;
mod commands;
mod output;

use commands::{bootstrap, node, org};

/// nodeinit CLI - organization and node ownership administration
#[derive(Parser)]
#[command(name = "nodeinit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Lookup service address
    #[arg(long, env = "NODEINIT_LOOKUP_URL", default_value = "http://127.0.0.1:8081", global = true)]
    lookup_addr: String,

    /// Bootstrap service address
    #[arg(long, env = "NODEINIT_BOOTSTRAP_URL", default_value = "http://127.0.0.1:8080", global = true)]
    bootstrap_addr: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    timeout: u64,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage organizations
    #[command(subcommand)]
    Org(org::OrgCommands),

    /// Manage node ownership
    #[command(subcommand)]
    Node(node::NodeCommands),

    /// Run the bootstrap protocol for a node
    Bootstrap(bootstrap::BootstrapArgs),

    /// Check service status
    Status,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let client = client::ApiClient::new(
        &cli.lookup_addr,
        &cli.bootstrap_addr,
        Duration::from_secs(cli.timeout),
    )?;
    tracing::debug!(
        "lookup at {}, bootstrap at {}",
        client.lookup_addr(),
        client.bootstrap_addr()
    );

    let result = match cli.command {
        Commands::Org(cmd) => org::execute(cmd, &client, cli.format).await,
        Commands::Node(cmd) => node::execute(cmd, &client, cli.format).await,
        Commands::Bootstrap(args) => bootstrap::execute(args, &client, cli.format).await,
        Commands::Status => {
            let mut healthy = true;
            for (name, addr) in [("Lookup", client.lookup_addr()), ("Bootstrap", client.bootstrap_addr())] {
                if client.ping(addr).await {
                    output::print_success(&format!("{} service is running at {}", name, addr));
                } else {
                    output::print_error(&format!("{} service is not responding at {}", name, addr));
                    healthy = false;
                }
            }
            if !healthy {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Version => {
            println!("nodeinit CLI v{}", nodeinit_common::VERSION);
            Ok(())
        }
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
