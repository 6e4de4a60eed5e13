//! Waiting for a handle to free up.
//!
//! The pool itself never blocks: [`Pool::get_connection`] returns `None` on
//! exhaustion. [`Pool::acquire`] layers a bounded wait on top of it, parking
//! the caller until a release is signalled or the deadline passes.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::PoolError;
use crate::handle::Handle;
use crate::pool::Pool;

impl<R> Pool<R> {
    /// Get a handle, waiting up to `timeout` for one to be released.
    ///
    /// Returns [`PoolError::AcquisitionTimeout`] if the pool stays exhausted
    /// until the deadline. A zero timeout behaves like a single
    /// [`get_connection`](Pool::get_connection) attempt.
    pub async fn acquire(&self, timeout: Duration) -> Result<Handle<R>, PoolError> {
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            // Register before checking so a release between the check and the
            // await is not missed.
            notified.as_mut().enable();

            if let Some(handle) = self.get_connection() {
                return Ok(handle);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                // One last attempt: a release may have landed right at the deadline.
                return self.get_connection().ok_or_else(|| {
                    tracing::debug!(pool = %self.id(), ?timeout, "timed out waiting for handle");
                    PoolError::AcquisitionTimeout(timeout)
                });
            }
        }
    }
}
