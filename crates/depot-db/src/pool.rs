//! # Pool
//!
//! Opening the SQLite database and handing out repositories.
//!
//! ```text
//!   storefront main                       tests
//!        │                                  │
//!   DbConfig::new(DEPOT_DB_PATH)       DbConfig::in_memory()
//!        │  max_connections(n)              │  one connection, no WAL
//!        └──────────────┬───────────────────┘
//!                       ▼
//!             Database::new(config) ──► migrations
//!                       │
//!      ┌────────────┬───┴────────┬─────────────┐
//!   products()   coupons()    carts()      orders()
//! ```
//!
//! ## Journal
//! File databases run in WAL mode: cart reads never wait on a checkout
//! transaction, and concurrent writers queue on `busy_timeout` instead of
//! failing with `SQLITE_BUSY`. In-memory databases live inside a single
//! connection and keep SQLite's defaults.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::cart::CartRepository;
use crate::repository::coupon::CouponRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool and connection settings.
///
/// ```rust,ignore
/// let config = DbConfig::new("./depot.db").max_connections(8);
/// let db = Database::new(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first use. `:memory:` for a throwaway database.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections (default 5).
    pub max_connections: u32,

    /// Connections kept open while idle (default 1).
    pub min_connections: u32,

    /// How long a handler waits for a free connection (default 30s).
    pub acquire_timeout: Duration,

    /// How long a writer waits on a locked database (default 5s).
    pub busy_timeout: Duration,

    /// Apply embedded migrations during [`Database::new`] (default true).
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Isolated, migrated database that disappears with the pool.
    pub fn in_memory() -> Self {
        DbConfig {
            // The database lives inside its one connection
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        if self.is_in_memory() {
            return SqliteConnectOptions::from_str("sqlite::memory:")
                .map(|options| options.foreign_keys(true))
                .map_err(|e| DbError::ConnectionFailed(e.to_string()));
        }

        Ok(SqliteConnectOptions::new()
            .filename(&self.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            // Off by default in SQLite
            .foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(self.acquire_timeout);

        if self.is_in_memory() {
            // Closing the only connection would drop the database
            options.idle_timeout(None).max_lifetime(None)
        } else {
            options
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the storefront database; hands out repositories.
///
/// Clones share one `SqlitePool`.
///
/// ```rust,ignore
/// let cart = db.carts().get_or_create(&customer_id, Utc::now()).await?;
/// let summary = CartSummary::of(&cart, now, &policy);
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let connect_options = config.connect_options()?;
        debug!(
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Connection options configured"
        );

        let pool = config
            .pool_options()
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            in_memory = config.is_in_memory(),
            "Database pool created"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending embedded migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn coupons(&self) -> CouponRepository {
        CouponRepository::new(self.pool.clone())
    }

    pub fn carts(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }

    /// Whether the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
