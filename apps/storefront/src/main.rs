//! Depot Storefront server.
//!
//! ```bash
//! # Seed a development catalog, then serve it
//! cargo run -p depot-db --bin seed
//! cargo run -p storefront
//! ```

use anyhow::Context;
use depot_db::{Database, DbConfig};
use storefront::{app, init_tracing, AppState, StorefrontConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Depot Storefront v{}", env!("CARGO_PKG_VERSION"));

    let config = StorefrontConfig::load().context("failed to load configuration")?;
    info!(
        addr = %config.socket_addr(),
        db = %config.db_path.display(),
        jerigen_fee = %config.jerigen_fee,
        jerigen_mode = ?config.jerigen_mode,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.db_path).max_connections(config.db_max_connections))
        .await
        .context("failed to open database")?;

    let addr = config.socket_addr();
    let state = AppState::new(config, db.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
