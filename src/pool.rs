#[cfg(not(feature = "loom"))]
mod thread_pool;

use crate::executor::ExecQueue;
#[cfg(not(feature = "loom"))]
pub use crate::pool::thread_pool::ThreadPool;
use std::{io, sync::Arc};
use thiserror::Error;

/// Errors reported by a thread pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// A pool was requested with zero worker threads.
    #[error("thread pool needs at least one worker thread")]
    NoThreads,
    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread")]
    Spawn(#[source] io::Error),
    /// The pool is being (or has been) destroyed and accepts no new work.
    #[error("thread pool is shutting down")]
    ShuttingDown,
}

/// A unit of pool work: `routine` is called with `context` at most once, on
/// some worker thread.
#[must_use]
#[derive(Debug)]
pub struct PoolTask {
    routine: fn(Arc<ExecQueue>),
    context: Arc<ExecQueue>,
}

impl PoolTask {
    pub(crate) fn new(routine: fn(Arc<ExecQueue>), context: Arc<ExecQueue>) -> Self {
        Self { routine, context }
    }

    /// Runs the routine on the calling thread.
    pub fn run(self) {
        let Self { routine, context } = self;
        routine(context);
    }

    /// The queue this task drives.
    pub fn context(&self) -> &Arc<ExecQueue> {
        &self.context
    }
}

/// Submission side of a thread pool.
///
/// Queue entries keep a `dyn Schedule` handle to the pool that accepted them
/// so the worker routine can hand the rest of its queue back to that pool.
pub trait Schedule: Send + Sync {
    /// Submits `task` from outside the pool.
    ///
    /// # Errors
    /// [`PoolError::ShuttingDown`] once destruction has begun. The task has
    /// not run and is dropped.
    fn schedule(&self, task: PoolTask) -> Result<(), PoolError>;

    /// Submits `task` from a routine currently running on this pool.
    ///
    /// Accepted while the pool runs and while it is being destroyed; in the
    /// latter case the task never runs and goes to the destroy call's
    /// cancellation callback instead.
    ///
    /// # Errors
    /// Hands `task` back once destruction has already passed the pending
    /// tasks to the cancellation callback (possible only when a pool is
    /// destroyed from one of its own workers). The caller must cancel it.
    fn reschedule(&self, task: PoolTask) -> Result<(), PoolTask>;
}

/// A thread pool an [`Executor`](crate::executor::Executor) can own.
pub trait Pool: Schedule + 'static {
    /// Stops the pool.
    ///
    /// Tasks already running are allowed to finish. Every task still pending
    /// afterwards, including ones rescheduled by those running tasks, is
    /// passed to `cancel` exactly once. Calls after the first are no-ops.
    fn destroy(&self, cancel: &mut dyn FnMut(PoolTask));
}
