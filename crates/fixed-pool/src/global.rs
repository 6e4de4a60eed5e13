//! Process-wide connection pool.
//!
//! [`get_instance`] and [`reset_instance`] operate on one shared
//! [`PoolManager`] of placeholder [`Connection`] handles. Code that needs a
//! different resource type, or more than one pool, should own a
//! [`PoolManager`] and pass it around instead.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::manager::PoolManager;
use crate::pool::Pool;

/// Name given to the process-wide pool.
pub const GLOBAL_POOL_NAME: &str = "global";

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

static MANAGER: Lazy<PoolManager<Connection>> = Lazy::new(|| {
    PoolManager::with_config(PoolConfig::new().name(GLOBAL_POOL_NAME), Connection::new)
});

/// Placeholder database connection held by the process-wide pool.
///
/// Performs no I/O; it only carries an id that is unique within the process.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    id: u64,
}

impl Connection {
    /// Open a new placeholder connection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Process-unique id of this connection.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection-{}", self.id)
    }
}

/// Get the process-wide pool, building it with `max_connections` handles if
/// none exists.
///
/// Once built, later calls return the same pool and ignore `max_connections`
/// until [`reset_instance`] is called.
pub fn get_instance(max_connections: usize) -> Result<Arc<Pool<Connection>>, PoolError> {
    MANAGER.get_instance(max_connections)
}

/// Drop the process-wide pool so the next [`get_instance`] builds a new one.
pub fn reset_instance() {
    MANAGER.reset_instance();
}

/// The manager behind [`get_instance`] and [`reset_instance`].
#[must_use]
pub fn manager() -> &'static PoolManager<Connection> {
    &MANAGER
}
