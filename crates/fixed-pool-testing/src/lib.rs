//! # fixed-pool-testing
//!
//! Test infrastructure for fixed-pool development.
//!
//! ## Features
//!
//! - Counting factories that record how many pooled values were created
//! - A barrier-synchronized race harness for first-access tests
//! - Tracing setup that routes pool logs through the test harness
//!
//! ## Example
//!
//! ```rust,ignore
//! use fixed_pool::PoolManager;
//! use fixed_pool_testing::{CountingFactory, race};
//!
//! let factory = CountingFactory::new();
//! let manager = std::sync::Arc::new(PoolManager::new(factory.factory()));
//!
//! let pools = race(8, {
//!     let manager = manager.clone();
//!     move |_| manager.get_instance(4).unwrap()
//! });
//! assert_eq!(factory.created(), 4);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod race;

pub use fixtures::{CountingFactory, TestResource, init_tracing};
pub use race::race;
