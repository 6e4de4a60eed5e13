//! Single-instance lifecycle for pools.
//!
//! A [`PoolManager`] owns at most one live [`Pool`] at a time. The first call
//! to [`PoolManager::get_instance`] builds the pool; every later call returns
//! the same `Arc` until [`PoolManager::reset_instance`] drops it.
//!
//! Check-and-create runs under one lock, so concurrent first callers all
//! receive the one pool that was built.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::handle::ResourceFactory;
use crate::pool::Pool;

/// Owner of the single live pool for one resource type.
pub struct PoolManager<R> {
    factory: Box<dyn ResourceFactory<R>>,
    template: PoolConfig,
    instance: Mutex<Option<Arc<Pool<R>>>>,
}

impl<R> PoolManager<R> {
    /// Create a manager that builds pools with `factory` and default settings.
    pub fn new<F>(factory: F) -> Self
    where
        F: ResourceFactory<R> + 'static,
    {
        Self::with_config(PoolConfig::default(), factory)
    }

    /// Create a manager whose pools take their name and acquire order from
    /// `template`. The capacity comes from each [`get_instance`] call.
    ///
    /// [`get_instance`]: PoolManager::get_instance
    pub fn with_config<F>(template: PoolConfig, factory: F) -> Self
    where
        F: ResourceFactory<R> + 'static,
    {
        Self {
            factory: Box::new(factory),
            template,
            instance: Mutex::new(None),
        }
    }

    /// Get the live pool, building it with `max_connections` handles if none
    /// exists.
    ///
    /// When a pool already exists, `max_connections` is ignored and the
    /// existing pool is returned unchanged. To change the capacity, call
    /// [`reset_instance`](PoolManager::reset_instance) first.
    pub fn get_instance(&self, max_connections: usize) -> Result<Arc<Pool<R>>, PoolError> {
        self.get_instance_with(self.template.clone().max_connections(max_connections))
    }

    /// Get the live pool, building it from `config` if none exists.
    ///
    /// As with [`get_instance`](PoolManager::get_instance), `config` is ignored
    /// when a pool already exists.
    pub fn get_instance_with(&self, config: PoolConfig) -> Result<Arc<Pool<R>>, PoolError> {
        let mut instance = self.instance.lock();

        if let Some(pool) = instance.as_ref() {
            if pool.total_connections() != config.max_connections {
                tracing::debug!(
                    pool = %pool.id(),
                    requested = config.max_connections,
                    capacity = pool.total_connections(),
                    "pool already exists, ignoring requested capacity"
                );
            }
            return Ok(Arc::clone(pool));
        }

        let pool = Arc::new(Pool::new(config, || self.factory.create())?);
        *instance = Some(Arc::clone(&pool));
        Ok(pool)
    }

    /// Get the live pool without building one.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Pool<R>>> {
        self.instance.lock().clone()
    }

    /// Drop the manager's reference to the live pool.
    ///
    /// The next [`get_instance`](PoolManager::get_instance) builds a fresh
    /// pool. Handles still checked out stay bound to the old pool, which lives
    /// on until its last `Arc` is dropped; the new pool rejects them.
    pub fn reset_instance(&self) {
        let previous = self.instance.lock().take();

        if let Some(pool) = previous {
            let status = pool.status();
            tracing::debug!(
                pool = %pool.id(),
                in_use = status.in_use,
                "pool instance reset"
            );
        }
    }
}

impl<R> fmt::Debug for PoolManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolManager")
            .field("template", &self.template)
            .field("instance", &*self.instance.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ReleaseViolation;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_get_instance_builds_once() {
        let manager: PoolManager<()> = PoolManager::new(|| ());
        let a = manager.get_instance(3).unwrap();
        let b = manager.get_instance(3).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.total_connections(), 3);
        assert_eq!(a.available_connections(), 3);
    }

    #[test]
    fn test_later_capacity_is_ignored() {
        let manager: PoolManager<()> = PoolManager::new(|| ());
        let first = manager.get_instance(2).unwrap();
        let second = manager.get_instance(8).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.total_connections(), 2);
    }

    #[test]
    fn test_invalid_capacity_leaves_no_instance() {
        let manager: PoolManager<()> = PoolManager::new(|| ());
        assert!(matches!(
            manager.get_instance(0),
            Err(PoolError::InvalidCapacity(0))
        ));
        assert!(manager.current().is_none());

        assert_eq!(manager.get_instance(1).unwrap().total_connections(), 1);
    }

    #[test]
    fn test_zero_capacity_ignored_once_built() {
        let manager: PoolManager<()> = PoolManager::new(|| ());
        let pool = manager.get_instance(2).unwrap();
        assert!(Arc::ptr_eq(&pool, &manager.get_instance(0).unwrap()));
    }

    #[test]
    fn test_reset_then_rebuild_with_new_capacity() {
        let manager: PoolManager<()> = PoolManager::new(|| ());
        let old = manager.get_instance(2).unwrap();
        let _held = old.get_connection().unwrap();

        manager.reset_instance();
        assert!(manager.current().is_none());

        let new = manager.get_instance(5).unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_ne!(old.id(), new.id());
        assert_eq!(new.total_connections(), 5);
        assert_eq!(new.available_connections(), 5);
        assert_eq!(old.available_connections(), 1);
    }

    #[test]
    fn test_stale_handle_rejected_after_reset() {
        let manager: PoolManager<()> = PoolManager::new(|| ());
        let old = manager.get_instance(1).unwrap();
        let stale = old.get_connection().unwrap();

        manager.reset_instance();
        let new = manager.get_instance(1).unwrap();

        let err = new.release_connection(stale).unwrap_err();
        assert!(matches!(
            err,
            PoolError::InvalidRelease {
                reason: ReleaseViolation::ForeignHandle { .. },
                ..
            }
        ));
        assert_eq!(new.available_connections(), 1);
    }

    #[test]
    fn test_reset_without_instance_is_noop() {
        let manager: PoolManager<()> = PoolManager::new(|| ());
        manager.reset_instance();
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_template_carries_name_and_order() {
        let template = PoolConfig::new()
            .name("reports")
            .acquire_order(crate::AcquireOrder::Lifo);
        let manager: PoolManager<()> = PoolManager::with_config(template, || ());
        let pool = manager.get_instance(4).unwrap();

        assert_eq!(&*pool.config().name, "reports");
        assert_eq!(pool.config().acquire_order, crate::AcquireOrder::Lifo);
        assert_eq!(pool.total_connections(), 4);
    }

    #[test]
    fn test_concurrent_first_access_builds_one_pool() {
        let created = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&created);
        let manager = Arc::new(PoolManager::<()>::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        }));
        let barrier = Arc::new(std::sync::Barrier::new(16));

        let threads: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    manager.get_instance(4).unwrap()
                })
            })
            .collect();

        let pools: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert!(pools.iter().all(|p| Arc::ptr_eq(p, &pools[0])));
        assert_eq!(created.load(Ordering::SeqCst), 4);
        assert_eq!(pools[0].available_connections(), 4);
    }
}
