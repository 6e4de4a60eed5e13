//! Test fixture utilities.

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Pooled value produced by [`CountingFactory`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestResource {
    /// Creation order, starting at 0 for each factory.
    pub serial: usize,
}

/// Factory that numbers the values it creates and counts them.
#[derive(Debug, Clone, Default)]
pub struct CountingFactory {
    created: Arc<AtomicUsize>,
}

impl CountingFactory {
    /// Create a factory that has produced nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a closure that creates values and bumps the shared counter.
    ///
    /// Every closure returned from the same factory shares one counter.
    #[must_use]
    pub fn factory(&self) -> impl Fn() -> TestResource + Send + Sync + 'static {
        let created = Arc::clone(&self.created);
        move || TestResource {
            serial: created.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Number of values created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

static TRACING: Once = Once::new();

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
