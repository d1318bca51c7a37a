mod error;
mod queue;
mod session;

pub use crate::executor::{
    error::ExecutorError,
    queue::ExecQueue,
    session::{EXECUTE_PANICKED, ExecSession},
};
use crate::{
    executor::queue::QueueEntry,
    pool::{Pool, PoolTask, Schedule},
    types::SessionState,
    utils::{ScopeGuard, panic_message},
};
#[cfg(not(feature = "loom"))]
use crate::{config::ExecutorConfig, pool::ThreadPool};
use std::{
    mem,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
#[cfg(not(feature = "loom"))]
use tracing::info;
use tracing::{debug, error, trace, warn};

/// Runs [`ExecSession`]s on a thread pool, one at a time per [`ExecQueue`].
///
/// Key responsibilities:
/// - Hands a queue to the pool only when it goes from empty to non-empty, so
///   at most one pool task per queue is ever pending or running.
/// - The worker that ran a queue's head session hands the remainder of the
///   queue back to the pool instead of looping, so a long queue neither
///   deepens the stack nor pins a worker thread.
/// - On [`deinit`](Self::deinit), reports every session still queued as
///   [`SessionState::Canceled`].
#[must_use]
#[derive(Debug)]
pub struct Executor<P: Pool> {
    pool: Arc<P>,
}

#[cfg(not(feature = "loom"))]
impl Executor<ThreadPool> {
    /// Starts an executor backed by a [`ThreadPool`] built from `config`.
    ///
    /// # Errors
    /// - [`ExecutorError::InvalidThreadCount`] if `config.nthreads()` is zero;
    ///   no thread is started.
    /// - [`ExecutorError::Pool`] if a worker thread could not be spawned.
    pub fn new(config: &ExecutorConfig) -> Result<Self, ExecutorError> {
        if config.nthreads() == 0 {
            return Err(ExecutorError::InvalidThreadCount);
        }
        let pool = ThreadPool::new(config)?;
        info!(nthreads = config.nthreads(), "executor started");
        Ok(Self::with_pool(pool))
    }

    /// Shorthand for [`Executor::new`] with default settings and `nthreads`
    /// workers.
    ///
    /// # Errors
    /// Same as [`Executor::new`].
    pub fn init(nthreads: usize) -> Result<Self, ExecutorError> {
        Self::new(&ExecutorConfig::new(nthreads))
    }
}

impl<P: Pool> Executor<P> {
    /// Drives queues through an already running pool.
    pub fn with_pool(pool: P) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Appends `session` to `queue`.
    ///
    /// If the queue was empty, a pool task is submitted to drain it;
    /// otherwise the worker currently responsible for the queue will reach
    /// the session in FIFO order. On success the session gets exactly one
    /// [`ExecSession::handle`] call, eventually.
    ///
    /// # Errors
    /// - [`ExecutorError::Alloc`] if the queue cannot grow.
    /// - [`ExecutorError::Pool`] if the pool refused the submission, in
    ///   particular once [`deinit`](Self::deinit) has begun.
    ///
    /// On error the session is neither queued, bound nor notified.
    pub fn request(
        &self,
        session: Arc<dyn ExecSession>,
        queue: &Arc<ExecQueue>,
    ) -> Result<(), ExecutorError> {
        let pool: Arc<dyn Schedule> = self.pool.clone();
        let mut sessions = queue.sessions.lock();
        sessions.try_reserve(1)?;
        sessions.push_back(QueueEntry {
            session: Arc::clone(&session),
            pool,
        });
        if sessions.len() == 1 {
            let task = PoolTask::new(executor_thread_routine, Arc::clone(queue));
            if let Err(err) = self.pool.schedule(task) {
                sessions.pop_back();
                drop(sessions);
                warn!(error = %err, "exec queue request rejected");
                return Err(err.into());
            }
            trace!("exec queue scheduled");
        }
        session.bind_queue(queue);
        Ok(())
    }

    /// Destroys the pool.
    ///
    /// Sessions already executing finish normally. Every queue that still
    /// has a pool task pending is drained and each of its sessions receives
    /// [`SessionState::Canceled`]. A request racing with this call either
    /// fails with [`ExecutorError::Pool`] or joins a queue that is canceled;
    /// requests following it always fail. Idempotent; also runs on drop.
    pub fn deinit(&self) {
        self.pool.destroy(&mut executor_cancel);
    }
}

impl<P: Pool> Drop for Executor<P> {
    fn drop(&mut self) {
        self.deinit();
    }
}

fn executor_thread_routine(queue: Arc<ExecQueue>) {
    // The head entry stays queued while its session runs: a non-empty list
    // means this queue's pool task is pending or running.
    let Some(session) = queue
        .sessions
        .lock()
        .front()
        .map(|entry| Arc::clone(&entry.session))
    else {
        warn!("exec queue scheduled while empty");
        return;
    };
    // Also runs when `handle` unwinds.
    let _advance = ScopeGuard::new(|| advance_queue(&queue));

    match panic::catch_unwind(AssertUnwindSafe(|| session.execute())) {
        Ok(()) => session.handle(SessionState::Finished, 0),
        Err(payload) => {
            error!(panic = panic_message(&*payload), "exec session panicked");
            session.handle(SessionState::Finished, EXECUTE_PANICKED);
        }
    }
}

/// Pops the finished head entry and hands the rest of the queue back to the
/// pool.
fn advance_queue(queue: &Arc<ExecQueue>) {
    let rejected = {
        let mut sessions = queue.sessions.lock();
        let Some(QueueEntry { pool, .. }) = sessions.pop_front() else {
            return;
        };
        if sessions.is_empty() {
            None
        } else {
            let task = PoolTask::new(executor_thread_routine, Arc::clone(queue));
            pool.reschedule(task).err()
        }
    };
    if let Some(task) = rejected {
        // The pool already handed out its pending tasks for cancellation.
        executor_cancel(task);
    }
}

fn executor_cancel(task: PoolTask) {
    let entries = mem::take(&mut *task.context().sessions.lock());
    debug!(count = entries.len(), "canceling queued sessions");
    for QueueEntry { session, .. } in entries {
        session.handle(SessionState::Canceled, 0);
    }
}
