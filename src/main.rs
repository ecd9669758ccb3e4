use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use peermark::auth::StoreTokenVerifier;
use peermark::cli::{AdminCommands, run_admin_check, run_admin_token};
use peermark::config::{ServerConfig, TimingConfig};
use peermark::engine::Engine;
use peermark::relations::Graph;
use peermark::server::{AppState, Clock, create_router};
use peermark::store::{MemoryStore, Store};

#[derive(Parser)]
#[command(name = "peermark")]
#[command(about = "A peer-review server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory holding store.json and peermark.toml
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let store_path = config.store_path();
    let store = Arc::new(MemoryStore::open(&store_path)?);

    // Refuse to serve a store with dangling references.
    Graph::build(&store.snapshot()?.tables)
        .with_context(|| format!("store at {} is inconsistent", store_path.display()))?;

    let shared: Arc<dyn Store> = store.clone();
    let state = Arc::new(AppState {
        engine: Engine::new(Arc::clone(&shared), config.timing),
        verifier: Arc::new(StoreTokenVerifier::new(shared)?),
        clock: Clock::System,
    });

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.save(&store_path)?;
    info!("Saved store to {}", store_path.display());

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("peermark=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Token {
                data_dir,
                email,
                admin,
                expires_in_seconds,
            } => run_admin_token(data_dir, email, admin, expires_in_seconds)?,
            AdminCommands::Check { data_dir } => run_admin_check(data_dir)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let data_dir: std::path::PathBuf = data_dir.into();
            let timing = TimingConfig::load(&data_dir)?;
            serve(ServerConfig {
                host,
                port,
                data_dir,
                timing,
            })
            .await?;
        }
    }

    Ok(())
}
