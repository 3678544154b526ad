mod config;
mod metrics;

use std::sync::Arc;

use axum::{Router, middleware};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use chirpy_api::auth::{AppState, AppStateInner};
use chirpy_api::guard::AuthGuard;
use chirpy_crypto::TokenService;
use chirpy_db::Database;

use crate::config::Config;
use crate::metrics::HitCounter;

#[derive(Debug, Parser)]
#[command(name = "chirpy", about = "Chirpy API server")]
struct Cli {
    /// Delete the database file before starting
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chirpy=debug,chirpy_api=debug,chirpy_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    info!("Debug mode (delete previous db): {}", cli.debug);
    if cli.debug && config.db_path.exists() {
        std::fs::remove_file(&config.db_path)?;
        info!("Removed {}", config.db_path.display());
    }

    // Init store
    let db = Arc::new(Database::open(&config.db_path)?);
    let tokens = TokenService::new(&config.jwt_secret);

    let state: AppState = Arc::new(AppStateInner {
        db: db.clone(),
        guard: AuthGuard::new(db.clone(), tokens, config.polka_key.clone()),
    });

    // Routes
    let hits = HitCounter::default();

    let static_files = Router::new()
        .nest_service("/app", ServeDir::new(&config.root))
        .layer(middleware::from_fn_with_state(hits.clone(), metrics::count_hit));

    let app = Router::new()
        .merge(chirpy_api::router(state))
        .merge(metrics::router(hits))
        .merge(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Chirpy listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router and every handler clone of the store are gone once serve returns.
    match Arc::try_unwrap(db) {
        Ok(db) => db.close()?,
        Err(_) => warn!("Store still shared at shutdown; skipping close"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
