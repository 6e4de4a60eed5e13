//! Pool error types.

use std::fmt;

use thiserror::Error;

use crate::handle::{HandleId, PoolId};

/// Errors that can occur during pool operations.
///
/// Exhaustion on the synchronous acquire path is not an error: it is reported
/// as `None` from [`Pool::get_connection`](crate::Pool::get_connection).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// A pool was requested with a capacity that cannot hold any handle.
    #[error("invalid pool capacity {0}: capacity must be greater than 0")]
    InvalidCapacity(usize),

    /// A handle was released that the pool does not track as in use.
    #[error("invalid release of handle {handle} into pool {pool}: {reason}")]
    InvalidRelease {
        /// Pool the release was attempted against.
        pool: PoolId,
        /// Handle that was released.
        handle: HandleId,
        /// Why the release was rejected.
        reason: ReleaseViolation,
    },

    /// No handle became available before the deadline.
    #[error("handle acquisition timeout after {0:?}")]
    AcquisitionTimeout(std::time::Duration),

    /// Pool configuration error.
    #[error("pool configuration error: {0}")]
    Configuration(String),
}

impl PoolError {
    /// Check if this error was caused by the caller breaking the release
    /// contract (foreign or double release).
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidRelease { .. })
    }

    /// Check if retrying the operation later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AcquisitionTimeout(_))
    }
}

/// Reason a release was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseViolation {
    /// The handle belongs to a different pool, or to a pool that has since
    /// been reset away.
    ForeignHandle {
        /// Pool the handle was acquired from.
        owner: PoolId,
    },
    /// The handle is already back in the available set.
    NotCheckedOut,
}

impl fmt::Display for ReleaseViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignHandle { owner } => write!(f, "handle belongs to pool {owner}"),
            Self::NotCheckedOut => f.write_str("handle is not checked out"),
        }
    }
}
