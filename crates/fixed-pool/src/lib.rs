//! # fixed-pool
//!
//! Fixed-capacity, thread-safe pool of reusable handles with single-instance
//! lifecycle control.
//!
//! A [`Pool`] creates all of its handles up front from a caller-supplied
//! factory and never grows. Callers check handles out with
//! [`Pool::get_connection`] and hand them back with
//! [`Pool::release_connection`]; an exhausted pool answers `None` instead of
//! blocking. A [`PoolManager`] keeps at most one pool alive at a time and
//! builds it exactly once, however many threads race for it.
//!
//! ## Features
//!
//! - Eager construction of exactly `capacity` handles
//! - Non-blocking acquire; optional async [`Pool::acquire`] with a deadline
//! - Rejection of foreign, stale, and double releases
//! - RAII [`PooledConnection`] guard via [`Pool::checkout`]
//! - Process-wide [`get_instance`] / [`reset_instance`] over placeholder
//!   [`Connection`] handles
//!
//! ## Example
//!
//! ```rust
//! use fixed_pool::PoolManager;
//!
//! let manager: PoolManager<String> = PoolManager::new(|| String::from("conn"));
//! let pool = manager.get_instance(3)?;
//!
//! let handle = pool.get_connection().expect("pool has capacity");
//! assert_eq!(pool.available_connections(), 2);
//!
//! pool.release_connection(handle)?;
//! assert_eq!(pool.available_connections(), 3);
//! # Ok::<(), fixed_pool::PoolError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod global;
pub mod handle;
pub mod manager;
pub mod pool;
mod wait;

pub use config::{AcquireOrder, PoolConfig};
pub use error::{PoolError, ReleaseViolation};
pub use global::{Connection, get_instance, reset_instance};
pub use handle::{Handle, HandleId, PoolId, ResourceFactory, SlotMetadata, SlotState};
pub use manager::PoolManager;
pub use pool::{Pool, PoolStatus, PooledConnection};
