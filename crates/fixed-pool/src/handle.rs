//! Pooled handles and their bookkeeping.
//!
//! A [`Handle`] is the unit of pooled capacity handed out by a
//! [`Pool`](crate::Pool). It wraps the value produced by a
//! [`ResourceFactory`] and carries the identity the pool uses to validate
//! releases: the id of the owning pool plus the slot it occupies.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a pool instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u64);

impl PoolId {
    pub(crate) fn next() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric id.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

/// Identifier of a handle within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(usize);

impl HandleId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Position of the handle in its pool, from `0` to `capacity - 1`.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Produces the values stored in a pool.
///
/// Called exactly `capacity` times while the pool is being constructed and
/// never again. Any `Fn() -> R` closure is a factory.
pub trait ResourceFactory<R>: Send + Sync {
    /// Create one pooled value.
    fn create(&self) -> R;
}

impl<R, F> ResourceFactory<R> for F
where
    F: Fn() -> R + Send + Sync,
{
    fn create(&self) -> R {
        self()
    }
}

/// A handle checked out of a pool.
///
/// Handles are cheap to clone; clones share the pooled value and the same
/// identity, so releasing two clones of one handle is a double release.
/// Equality and hashing use identity only, never the pooled value.
///
/// Each handle also carries the checkout it was issued for. Once released,
/// a handle (or any clone of it) stays stale even after the same slot is
/// checked out again, and the pool rejects it.
pub struct Handle<R> {
    pool: PoolId,
    id: HandleId,
    generation: u64,
    resource: Arc<R>,
}

impl<R> Handle<R> {
    pub(crate) fn new(pool: PoolId, id: HandleId, generation: u64, resource: Arc<R>) -> Self {
        Self {
            pool,
            id,
            generation,
            resource,
        }
    }

    /// Id of the pool this handle was created by.
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        self.pool
    }

    /// Id of this handle within its pool.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Checkout number this handle was issued for.
    ///
    /// Matches [`SlotMetadata::checkout_count`] while the checkout is live.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Get a reference to the pooled value.
    #[must_use]
    pub fn resource(&self) -> &R {
        &self.resource
    }
}

impl<R> Clone for Handle<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool,
            id: self.id,
            generation: self.generation,
            resource: Arc::clone(&self.resource),
        }
    }
}

impl<R> Deref for Handle<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R> PartialEq for Handle<R> {
    fn eq(&self, other: &Self) -> bool {
        self.pool == other.pool && self.id == other.id
    }
}

impl<R> Eq for Handle<R> {}

impl<R> Hash for Handle<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pool.hash(state);
        self.id.hash(state);
    }
}

impl<R> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("pool", &self.pool)
            .field("id", &self.id)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Slot state tracked by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Handle is in the available set.
    Idle,
    /// Handle is checked out by a caller.
    InUse,
}

impl SlotState {
    /// Check if the handle is available for checkout.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Check if the handle is currently checked out.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::InUse)
    }
}

/// Metadata about a pooled handle.
#[derive(Debug, Clone)]
pub struct SlotMetadata {
    /// Identifier of the handle.
    pub id: HandleId,
    /// When the handle was created.
    pub created_at: Instant,
    /// When the handle was last checked out or returned.
    pub last_used_at: Instant,
    /// Number of times the handle has been checked out.
    pub checkout_count: u64,
    /// Current state of the handle.
    pub state: SlotState,
}

impl SlotMetadata {
    pub(crate) fn new(id: HandleId) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_used_at: now,
            checkout_count: 0,
            state: SlotState::Idle,
        }
    }

    /// Time since the handle was last checked out or returned.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_used_at.elapsed()
    }

    pub(crate) fn mark_checkout(&mut self) {
        self.last_used_at = Instant::now();
        self.checkout_count += 1;
        self.state = SlotState::InUse;
    }

    pub(crate) fn mark_checkin(&mut self) {
        self.last_used_at = Instant::now();
        self.state = SlotState::Idle;
    }
}
