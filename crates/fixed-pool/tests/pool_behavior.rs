//! Pool and manager behavior under sequential and concurrent use.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fixed_pool::{AcquireOrder, Pool, PoolConfig, PoolError, PoolManager, ReleaseViolation};
use fixed_pool_testing::{CountingFactory, TestResource, init_tracing, race};

fn counting_pool(capacity: usize) -> (Arc<Pool<TestResource>>, CountingFactory) {
    init_tracing();
    let factory = CountingFactory::new();
    let pool = Pool::with_capacity(capacity, factory.factory()).unwrap();
    (Arc::new(pool), factory)
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_new_pool_counts_match_capacity() {
    for capacity in [1, 2, 7, 64] {
        let (pool, factory) = counting_pool(capacity);
        assert_eq!(pool.available_connections(), capacity);
        assert_eq!(pool.total_connections(), capacity);
        assert_eq!(factory.created(), capacity);
    }
}

#[test]
fn test_zero_capacity_fails_fast() {
    let factory = CountingFactory::new();
    let err = Pool::<TestResource>::with_capacity(0, factory.factory()).unwrap_err();

    assert!(matches!(err, PoolError::InvalidCapacity(0)));
    assert_eq!(factory.created(), 0);
}

#[test]
fn test_settings_string_builds_pool() {
    let config = PoolConfig::from_settings("Capacity=3;Order=LIFO;Name=reports").unwrap();
    let pool = Pool::<TestResource>::new(config, CountingFactory::new().factory()).unwrap();

    assert_eq!(pool.total_connections(), 3);
    assert_eq!(pool.config().acquire_order, AcquireOrder::Lifo);
    assert_eq!(&*pool.config().name, "reports");
}

// =============================================================================
// Acquire / Release
// =============================================================================

#[test]
fn test_capacity_three_scenario() {
    let (pool, _) = counting_pool(3);

    let handles: Vec<_> = (0..3)
        .map(|_| pool.get_connection().expect("capacity left"))
        .collect();
    assert!(pool.get_connection().is_none());
    assert_eq!(pool.available_connections(), 0);

    let mut handles = handles.into_iter();
    pool.release_connection(handles.next().unwrap()).unwrap();
    assert_eq!(pool.available_connections(), 1);
    assert!(pool.get_connection().is_some());
}

#[test]
fn test_handles_cover_every_created_value() {
    let (pool, _) = counting_pool(5);
    let serials: HashSet<usize> = std::iter::from_fn(|| pool.get_connection())
        .map(|handle| handle.serial)
        .collect();

    assert_eq!(serials, (0..5).collect::<HashSet<_>>());
}

#[test]
fn test_release_then_acquire_keeps_capacity() {
    let (pool, _) = counting_pool(2);
    for _ in 0..100 {
        let handle = pool.get_connection().unwrap();
        pool.release_connection(handle).unwrap();
        assert_eq!(pool.available_connections(), 2);
    }
}

#[test]
fn test_invalid_releases_leave_counts_alone() {
    let (pool, _) = counting_pool(2);
    let (other, _) = counting_pool(2);

    let handle = pool.get_connection().unwrap();
    let duplicate = handle.clone();
    pool.release_connection(handle).unwrap();

    let double = pool.release_connection(duplicate).unwrap_err();
    assert!(double.is_caller_error());

    let foreign = pool
        .release_connection(other.get_connection().unwrap())
        .unwrap_err();
    assert!(matches!(
        foreign,
        PoolError::InvalidRelease {
            reason: ReleaseViolation::ForeignHandle { owner },
            ..
        } if owner == other.id()
    ));

    assert_eq!(pool.available_connections(), 2);
    assert_eq!(pool.in_use_connections(), 0);
}

#[test]
fn test_released_clone_cannot_free_next_holder() {
    let (pool, _) = counting_pool(1);

    let first = pool.get_connection().unwrap();
    let leftover = first.clone();
    pool.release_connection(first).unwrap();

    let current = pool.get_connection().unwrap();
    assert_eq!(current, leftover);

    let err = pool.release_connection(leftover).unwrap_err();
    assert!(matches!(
        err,
        PoolError::InvalidRelease {
            reason: ReleaseViolation::NotCheckedOut,
            ..
        }
    ));
    assert!(pool.get_connection().is_none());
    assert_eq!(pool.available_connections(), 0);
    assert_eq!(pool.in_use_connections(), 1);

    pool.release_connection(current).unwrap();
    assert_eq!(pool.available_connections(), 1);
}

#[test]
fn test_checkout_guards_release_on_drop() {
    let (pool, _) = counting_pool(2);
    let a = pool.checkout().unwrap();
    let b = pool.checkout().unwrap();
    assert!(pool.checkout().is_none());
    assert_ne!(a.serial, b.serial);

    drop(a);
    assert_eq!(pool.available_connections(), 1);
    drop(b);
    assert_eq!(pool.available_connections(), 2);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_first_access_builds_one_pool() {
    init_tracing();
    let factory = CountingFactory::new();
    let manager = Arc::new(PoolManager::<TestResource>::new(factory.factory()));

    let pools = race(32, {
        let manager = Arc::clone(&manager);
        move |_| manager.get_instance(4).unwrap()
    });

    assert!(pools.iter().all(|pool| Arc::ptr_eq(pool, &pools[0])));
    assert_eq!(factory.created(), 4);
    assert_eq!(pools[0].available_connections(), 4);
    assert_eq!(pools[0].total_connections(), 4);
}

#[test]
fn test_concurrent_acquire_never_hands_out_a_handle_twice() {
    let (pool, _) = counting_pool(8);

    let grabbed = race(16, {
        let pool = Arc::clone(&pool);
        move |_| pool.get_connection()
    });

    let held: Vec<_> = grabbed.into_iter().flatten().collect();
    let ids: HashSet<_> = held.iter().map(|handle| handle.id()).collect();
    assert_eq!(held.len(), 8);
    assert_eq!(ids.len(), 8);
    assert_eq!(pool.available_connections(), 0);
}

#[test]
fn test_concurrent_churn_preserves_invariant() {
    let (pool, _) = counting_pool(3);
    let holders: Arc<Vec<AtomicUsize>> = Arc::new((0..3).map(|_| AtomicUsize::new(0)).collect());

    race(12, {
        let pool = Arc::clone(&pool);
        let holders = Arc::clone(&holders);
        move |_| {
            let mut returned = None;
            for round in 0..1_000 {
                let Some(handle) = pool.get_connection() else {
                    continue;
                };
                let holder = &holders[handle.id().index()];
                assert_eq!(holder.fetch_add(1, Ordering::SeqCst), 0, "{} held twice", handle.id());

                let status = pool.status();
                assert!(status.in_use >= 1);
                assert!(status.available < status.total);
                assert_eq!(status.available + status.in_use, status.total);

                // Every few rounds, try handing back a clone from an earlier
                // checkout; it must never land while someone holds the slot.
                if round % 7 == 0 {
                    if let Some(stale) = returned.take() {
                        assert!(pool.release_connection(stale).unwrap_err().is_caller_error());
                    }
                }

                holder.fetch_sub(1, Ordering::SeqCst);
                returned = Some(handle.clone());
                pool.release_connection(handle).unwrap();
            }
        }
    });

    assert_eq!(pool.available_connections(), 3);
    assert_eq!(pool.in_use_connections(), 0);
    assert_eq!(pool.total_connections(), 3);
}

#[test]
fn test_reset_under_load_builds_independent_pool() {
    init_tracing();
    let manager: PoolManager<TestResource> = PoolManager::new(CountingFactory::new().factory());
    let old = manager.get_instance(2).unwrap();
    let held = old.get_connection().unwrap();

    manager.reset_instance();
    let new = manager.get_instance(6).unwrap();

    assert_eq!(new.total_connections(), 6);
    assert_eq!(new.available_connections(), 6);
    assert!(new.release_connection(held.clone()).is_err());

    // The old pool still accepts its own handle.
    old.release_connection(held).unwrap();
    assert_eq!(old.available_connections(), 2);
}
