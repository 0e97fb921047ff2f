//! # storefront: Depot Storefront JSON API
//!
//! Customer cart and checkout endpoints plus the back office, on top of
//! `depot-core` (rules) and `depot-db` (SQLite).
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP ──► CORS ──► Trace ──► Timeout ──► Router ──► handler             │
//! │                                                       │                 │
//! │                              ┌────────────────────────┼──────────────┐  │
//! │                              ▼                        ▼              ▼  │
//! │                        depot-core rules        depot-db repos   CartLocks│
//! │                                                                         │
//! │  handler error ──► ApiError ──► status + {code, message}                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::http::Uri;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, StorefrontConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::{AppState, CartLocks};

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,depot=debug,storefront=debug,sqlx=warn";

/// Builds the application router with middleware and state.
pub fn app(state: AppState) -> Router {
    let timeout = state.config().request_timeout;

    routes::routes()
        .fallback(fallback)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::not_found("Route", uri.path())
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`].
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
