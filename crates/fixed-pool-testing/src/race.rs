//! Barrier-synchronized concurrency harness.

use std::sync::{Arc, Barrier};
use std::thread;

/// Run `f` on `threads` OS threads released at the same instant.
///
/// Each thread receives its index. Results come back in index order. A panic
/// on any thread is re-raised on the caller once every thread has finished.
pub fn race<T, F>(threads: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(threads));
    let f = Arc::new(f);

    let handles: Vec<_> = (0..threads)
        .map(|index| {
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            thread::spawn(move || {
                barrier.wait();
                f(index)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(threads);
    let mut panic = None;
    for handle in handles {
        match handle.join() {
            Ok(value) => results.push(value),
            Err(payload) => panic = panic.or(Some(payload)),
        }
    }

    if let Some(payload) = panic {
        std::panic::resume_unwind(payload);
    }
    results
}
