//! Predex API Server
//!
//! HTTP API for the paper-trading prediction market exchange.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use predex_ledger::{AccountService, FaucetService, GovernanceService, TradingLedger};
use predex_store::{seed_demo_markets, MemoryBackend};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<MemoryBackend>,
    pub ledger: Arc<TradingLedger<MemoryBackend>>,
    pub accounts: Arc<AccountService<MemoryBackend>>,
    pub faucet: Arc<FaucetService<MemoryBackend>>,
    pub governance: Arc<GovernanceService<MemoryBackend>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,predex_api=debug")),
        )
        .init();

    info!("Starting Predex API");

    // All state lives in the in-memory backend; the hosted backend is the
    // system of record across sessions and is out of scope here.
    let backend = Arc::new(MemoryBackend::new());

    let seeded = seed_demo_markets(backend.as_ref())
        .await
        .expect("Failed to seed demo markets");
    info!("Seeded {} demo markets", seeded);

    let state = AppState {
        ledger: Arc::new(TradingLedger::new(Arc::clone(&backend))),
        accounts: Arc::new(AccountService::new(Arc::clone(&backend))),
        faucet: Arc::new(FaucetService::new(Arc::clone(&backend))),
        governance: Arc::new(GovernanceService::new(Arc::clone(&backend))),
        backend,
    };

    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Build router
    let app = Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .with_state(state);

    // Start server
    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
