use crate::pool::PoolError;
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors returned by [`Executor`](crate::executor::Executor) operations.
///
/// A failed `request` leaves the session unqueued and un-notified; disposing
/// of it or retrying is up to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutorError {
    /// The executor was configured with zero worker threads.
    #[error("executor needs at least one worker thread")]
    InvalidThreadCount,
    /// The queue could not grow to hold another entry.
    #[error("failed to allocate queue entry")]
    Alloc(#[from] TryReserveError),
    /// The thread pool could not be started or refused the submission.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
