//! Fixed-capacity pool implementation.

use std::collections::VecDeque;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::config::{AcquireOrder, PoolConfig};
use crate::error::{PoolError, ReleaseViolation};
use crate::handle::{Handle, HandleId, PoolId, ResourceFactory, SlotMetadata};

/// A fixed-capacity pool of reusable handles.
///
/// All handles are created up front by the factory passed to [`Pool::new`];
/// the pool never grows or shrinks. Acquiring from an exhausted pool returns
/// `None` immediately instead of waiting.
///
/// Every operation is safe to call from many threads at once. The available
/// queue and per-handle state sit behind a single lock, so
/// `available + in_use == total` holds at every observation point.
pub struct Pool<R> {
    id: PoolId,
    config: PoolConfig,
    resources: Box<[Arc<R>]>,
    state: Mutex<PoolState>,
    pub(crate) released: Notify,
}

struct PoolState {
    available: VecDeque<usize>,
    slots: Vec<SlotMetadata>,
}

impl PoolState {
    fn take_available(&mut self, order: AcquireOrder) -> Option<usize> {
        match order {
            AcquireOrder::Fifo => self.available.pop_front(),
            AcquireOrder::Lifo => self.available.pop_back(),
        }
    }
}

impl<R> Pool<R> {
    /// Create a pool and eagerly fill it with `config.max_connections`
    /// handles produced by `factory`.
    ///
    /// Fails with [`PoolError::InvalidCapacity`] when the capacity is zero.
    pub fn new<F>(config: PoolConfig, factory: F) -> Result<Self, PoolError>
    where
        F: ResourceFactory<R>,
    {
        config.validate()?;

        let id = PoolId::next();
        let (resources, state) = Self::initialize_pool(config.max_connections, &factory);

        tracing::debug!(
            pool = %id,
            name = %config.name,
            capacity = resources.len(),
            order = %config.acquire_order,
            "pool initialized"
        );

        Ok(Self {
            id,
            config,
            resources,
            state: Mutex::new(state),
            released: Notify::new(),
        })
    }

    /// Create a pool with the given capacity and default settings.
    pub fn with_capacity<F>(capacity: usize, factory: F) -> Result<Self, PoolError>
    where
        F: ResourceFactory<R>,
    {
        Self::new(PoolConfig::new().max_connections(capacity), factory)
    }

    // Only reachable from `new`, so a pool is filled exactly once.
    fn initialize_pool<F>(capacity: usize, factory: &F) -> (Box<[Arc<R>]>, PoolState)
    where
        F: ResourceFactory<R>,
    {
        let resources: Box<[Arc<R>]> = (0..capacity).map(|_| Arc::new(factory.create())).collect();
        let state = PoolState {
            available: (0..capacity).collect(),
            slots: (0..capacity)
                .map(|index| SlotMetadata::new(HandleId::from_index(index)))
                .collect(),
        };
        (resources, state)
    }

    /// Take a handle out of the available set.
    ///
    /// Returns `None` when every handle is checked out. This does not block,
    /// does not grow the pool, and has no side effects when it fails.
    pub fn get_connection(&self) -> Option<Handle<R>> {
        let (index, generation, available) = {
            let mut state = self.state.lock();
            let Some(index) = state.take_available(self.config.acquire_order) else {
                drop(state);
                tracing::trace!(pool = %self.id, "pool exhausted");
                return None;
            };
            let slot = &mut state.slots[index];
            slot.mark_checkout();
            let generation = slot.checkout_count;
            (index, generation, state.available.len())
        };

        let id = HandleId::from_index(index);
        tracing::trace!(pool = %self.id, handle = %id, generation, available, "handle acquired");
        Some(Handle::new(
            self.id,
            id,
            generation,
            Arc::clone(&self.resources[index]),
        ))
    }

    /// Return a handle to the available set.
    ///
    /// Rejects handles that came from another pool (including a pool that has
    /// since been reset away) and handles that are not checked out, such as a
    /// second release of the same handle. A handle from an earlier checkout of
    /// a slot that has since been handed out again counts as not checked out.
    /// A rejected release leaves the pool unchanged.
    pub fn release_connection(&self, handle: Handle<R>) -> Result<(), PoolError> {
        let id = handle.id();

        if handle.pool_id() != self.id {
            return Err(self.reject(
                id,
                ReleaseViolation::ForeignHandle {
                    owner: handle.pool_id(),
                },
            ));
        }

        let available = {
            let mut state = self.state.lock();
            let violation = match state.slots.get(id.index()) {
                None => Some(ReleaseViolation::ForeignHandle {
                    owner: handle.pool_id(),
                }),
                Some(slot)
                    if !slot.state.is_busy() || slot.checkout_count != handle.generation() =>
                {
                    Some(ReleaseViolation::NotCheckedOut)
                }
                Some(_) => None,
            };
            if let Some(reason) = violation {
                drop(state);
                return Err(self.reject(id, reason));
            }
            state.slots[id.index()].mark_checkin();
            state.available.push_back(id.index());
            state.available.len()
        };

        self.released.notify_one();
        tracing::trace!(pool = %self.id, handle = %id, available, "handle released");
        Ok(())
    }

    fn reject(&self, handle: HandleId, reason: ReleaseViolation) -> PoolError {
        tracing::warn!(pool = %self.id, handle = %handle, %reason, "rejected handle release");
        PoolError::InvalidRelease {
            pool: self.id,
            handle,
            reason,
        }
    }

    /// Number of handles currently available.
    #[must_use]
    pub fn available_connections(&self) -> usize {
        self.state.lock().available.len()
    }

    /// Number of handles currently checked out.
    #[must_use]
    pub fn in_use_connections(&self) -> usize {
        self.status().in_use
    }

    /// Total number of handles. Constant for the life of the pool.
    #[must_use]
    pub fn total_connections(&self) -> usize {
        self.resources.len()
    }

    /// Get a consistent snapshot of the pool counts.
    ///
    /// `available` comes from the available queue and `in_use` from the slot
    /// states, both read under one lock.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.state.lock();
        PoolStatus {
            available: state.available.len(),
            in_use: state.slots.iter().filter(|slot| slot.state.is_busy()).count(),
            total: self.resources.len(),
        }
    }

    /// Get bookkeeping for one handle.
    #[must_use]
    pub fn slot_metadata(&self, id: HandleId) -> Option<SlotMetadata> {
        self.state.lock().slots.get(id.index()).cloned()
    }

    /// Process-unique id of this pool.
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Take a handle wrapped in a guard that releases it when dropped.
    pub fn checkout(self: &Arc<Self>) -> Option<PooledConnection<R>> {
        self.get_connection().map(|handle| PooledConnection {
            handle: Some(handle),
            pool: Arc::clone(self),
        })
    }
}

impl<R> fmt::Debug for Pool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Number of handles available.
    pub available: usize,
    /// Number of handles currently checked out.
    pub in_use: usize,
    /// Total number of handles.
    pub total: usize,
}

impl PoolStatus {
    /// Percentage of handles checked out, from 0.0 to 100.0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.in_use as f64 / self.total as f64 * 100.0
    }
}

/// A handle checked out through [`Pool::checkout`].
///
/// When dropped, the handle is automatically returned to the pool.
pub struct PooledConnection<R> {
    handle: Option<Handle<R>>,
    pool: Arc<Pool<R>>,
}

impl<R> PooledConnection<R> {
    /// Get the underlying handle.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn handle(&self) -> &Handle<R> {
        // Only `detach` and `drop` take the handle, and both consume the guard.
        self.handle.as_ref().expect("handle present until detach or drop")
    }

    /// Detach the handle from the guard.
    ///
    /// The handle will not be returned to the pool when the guard is dropped;
    /// the caller becomes responsible for [`Pool::release_connection`].
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn detach(mut self) -> Handle<R> {
        self.handle.take().expect("handle present until detach or drop")
    }
}

impl<R> Deref for PooledConnection<R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.handle().resource()
    }
}

impl<R> fmt::Debug for PooledConnection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("handle", &self.handle)
            .field("pool", &self.pool.id())
            .finish()
    }
}

impl<R> Drop for PooledConnection<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Failure is already logged by the pool; a clone was released first.
            let _ = self.pool.release_connection(handle);
        }
    }
}
