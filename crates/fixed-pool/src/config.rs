//! Pool configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::PoolError;

/// Default pool name used in log output.
pub const DEFAULT_POOL_NAME: &str = "default";

/// Default number of handles in a pool.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Order in which available handles are handed out.
///
/// Callers must not rely on which handle they receive; the order only affects
/// how evenly checkouts are spread across handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquireOrder {
    /// Hand out the handle that has been idle the longest.
    #[default]
    Fifo,
    /// Hand out the most recently returned handle.
    Lifo,
}

impl fmt::Display for AcquireOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => f.write_str("fifo"),
            Self::Lifo => f.write_str("lifo"),
        }
    }
}

impl FromStr for AcquireOrder {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fifo" | "queue" => Ok(Self::Fifo),
            "lifo" | "stack" => Ok(Self::Lifo),
            other => Err(PoolError::Configuration(format!(
                "invalid acquire order: {other}"
            ))),
        }
    }
}

/// Configuration for a pool.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future minor versions without breaking changes. Use the builder
/// pattern methods or [`Default::default()`] to construct instances.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Number of handles created at construction. Fixed for the pool's life.
    pub max_connections: usize,

    /// Order in which available handles are handed out.
    pub acquire_order: AcquireOrder,

    /// Name attached to the pool's log output.
    pub name: Arc<str>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_order: AcquireOrder::default(),
            name: Arc::from(DEFAULT_POOL_NAME),
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of handles in the pool.
    #[must_use]
    pub fn max_connections(mut self, count: usize) -> Self {
        self.max_connections = count;
        self
    }

    /// Set the order in which available handles are handed out.
    #[must_use]
    pub fn acquire_order(mut self, order: AcquireOrder) -> Self {
        self.acquire_order = order;
        self
    }

    /// Set the name attached to the pool's log output.
    #[must_use]
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Parse a configuration from a `key=value;key=value` settings string.
    ///
    /// Keys are case-insensitive. Recognized keys:
    ///
    /// - `max connections`, `max_connections`, `capacity`, `size`
    /// - `acquire order`, `acquire_order`, `order` (`fifo` or `lifo`)
    /// - `name`, `pool name`
    ///
    /// Unset keys keep their defaults. The result is validated before it is
    /// returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fixed_pool::{AcquireOrder, PoolConfig};
    ///
    /// let config = PoolConfig::from_settings("Max Connections=4;Order=lifo;Name=reports")?;
    /// assert_eq!(config.max_connections, 4);
    /// assert_eq!(config.acquire_order, AcquireOrder::Lifo);
    /// assert_eq!(&*config.name, "reports");
    /// # Ok::<(), fixed_pool::PoolError>(())
    /// ```
    pub fn from_settings(settings: &str) -> Result<Self, PoolError> {
        let mut config = Self::default();

        for part in settings.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| PoolError::Configuration(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "max connections" | "max_connections" | "capacity" | "size" => {
                    config.max_connections = value.parse().map_err(|_| {
                        PoolError::Configuration(format!("invalid max connections: {value}"))
                    })?;
                }
                "acquire order" | "acquire_order" | "order" => {
                    config.acquire_order = value.parse()?;
                }
                "name" | "pool name" => {
                    if value.is_empty() {
                        return Err(PoolError::Configuration("pool name cannot be empty".into()));
                    }
                    config.name = Arc::from(value);
                }
                _ => {
                    tracing::debug!(key = key.as_str(), "ignoring unknown pool setting");
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_connections == 0 {
            return Err(PoolError::InvalidCapacity(self.max_connections));
        }
        Ok(())
    }
}
