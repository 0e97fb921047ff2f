//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use depot_core::PricingPolicy;
use depot_db::Database;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheap to clone: everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    db: Database,
    policy: PricingPolicy,
    cart_locks: CartLocks,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, db: Database) -> Self {
        let policy = config.pricing_policy();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                policy,
                cart_locks: CartLocks::default(),
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get the pricing policy in effect.
    #[must_use]
    pub fn policy(&self) -> &PricingPolicy {
        &self.inner.policy
    }

    /// Get the per-customer cart locks.
    #[must_use]
    pub fn cart_locks(&self) -> &CartLocks {
        &self.inner.cart_locks
    }
}

// =============================================================================
// Cart Locks
// =============================================================================

/// Serializes cart mutations per customer.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST .../cust-1/cart/items ──┐                                         │
/// │                               ├──► lock("cust-1") ──► load → mutate →   │
/// │  POST .../cust-1/cart/coupon ─┘    (one at a time)     save → unlock    │
/// │                                                                         │
/// │  POST .../cust-2/cart/items ─────► lock("cust-2") ──► runs in parallel  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Only covers this process. Writers elsewhere are caught by the cart's
/// version check on save.
#[derive(Default)]
pub struct CartLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CartLocks {
    /// Waits for exclusive access to a customer's cart.
    ///
    /// The lock is released when the returned guard is dropped.
    pub async fn lock(&self, customer_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(customer_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of customers with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
