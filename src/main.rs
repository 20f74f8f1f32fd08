//! tavernd - virtual tabletop server daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tavernd::{Config, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tavern virtual tabletop server
#[derive(Parser, Debug)]
#[command(name = "tavernd", version, about = "Run the tavern server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// SQLite database file (overrides config; default is in-memory)
    #[arg(short, long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load config: defaults, file, environment, then flags
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = args.database {
        config.db_path = Some(database);
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tavernd=info,tower_http=debug".into());
    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
