//! contractsign API binary

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contractsign_api::{build_router, state, AppState};

/// Command-line arguments for the contractsign API server
#[derive(Parser, Debug)]
#[command(name = "contractsign-api")]
#[command(about = "Field persistence and contract send API")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// SQLite connection URL (defaults to the platform data directory)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Refuse to send contracts where a signer has no signature field
    #[arg(long, env = "ENFORCE_READINESS", default_value_t = true, action = ArgAction::Set)]
    enforce_readiness: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("contractsign_api={}", log_level).parse()?)
                .add_directive(format!("contractsign_core={}", log_level).parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize application state
    info!("Initializing contractsign API...");
    let database_url = args
        .database_url
        .unwrap_or_else(state::default_database_url);
    let state = AppState::connect(&database_url, args.enforce_readiness).await?;
    if !state.enforce_readiness {
        info!("Send readiness is not enforced server-side");
    }

    let app = build_router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting contractsign API on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
