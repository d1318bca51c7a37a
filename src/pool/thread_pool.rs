use crate::{
    config::ExecutorConfig,
    pool::{Pool, PoolError, PoolTask, Schedule},
    utils::panic_message,
};
use parking_lot::{Condvar, Mutex};
use std::{
    collections::{HashMap, VecDeque},
    io, mem,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle, ThreadId},
};
use tracing::{debug, error, info, warn};

/// Fixed-size pool of named OS threads pulling [`PoolTask`]s from a shared
/// FIFO.
///
/// Threads are created eagerly and live until [`Pool::destroy`], which also
/// runs on drop.
#[derive(Debug)]
pub struct ThreadPool {
    shared: Arc<Shared>,
    // Keyed by thread id so `destroy` can recognise being called from one of
    // its own workers.
    handles: Mutex<HashMap<ThreadId, JoinHandle<()>>>,
    nthreads: usize,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    available: Condvar,
}

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<PoolTask>,
    terminating: bool,
    // Pending tasks were handed to `destroy`'s cancellation callback.
    drained: bool,
}

impl ThreadPool {
    /// Starts `config.nthreads()` workers.
    ///
    /// # Errors
    /// - [`PoolError::NoThreads`] if the configured thread count is zero.
    /// - [`PoolError::Spawn`] if a worker could not be started; workers
    ///   started before it are stopped and joined first.
    pub fn new(config: &ExecutorConfig) -> Result<Self, PoolError> {
        let nthreads = config.nthreads();
        if nthreads == 0 {
            return Err(PoolError::NoThreads);
        }
        let pool = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                available: Condvar::new(),
            }),
            handles: Mutex::new(HashMap::with_capacity(nthreads)),
            nthreads,
        };
        for idx in 0..nthreads {
            match pool.spawn_worker(config, idx) {
                Ok(handle) => {
                    pool.handles.lock().insert(handle.thread().id(), handle);
                }
                Err(err) => {
                    warn!(idx, error = %err, "failed to spawn worker thread");
                    pool.destroy(&mut |_: PoolTask| {});
                    return Err(PoolError::Spawn(err));
                }
            }
        }
        info!(nthreads, "thread pool started");
        Ok(pool)
    }

    /// Number of worker threads the pool was started with.
    #[must_use]
    pub fn nthreads(&self) -> usize {
        self.nthreads
    }

    /// Whether the calling thread is one of this pool's live workers.
    #[must_use]
    pub fn in_pool(&self) -> bool {
        self.handles.lock().contains_key(&thread::current().id())
    }

    fn spawn_worker(&self, config: &ExecutorConfig, idx: usize) -> io::Result<JoinHandle<()>> {
        let name = format!("{}-{idx}", config.thread_name_prefix());
        let mut builder = thread::Builder::new().name(name);
        if let Some(stack_size) = config.worker_stack_size() {
            builder = builder.stack_size(stack_size);
        }
        let shared = Arc::clone(&self.shared);
        builder.spawn(move || shared.worker_loop())
    }
}

impl Shared {
    fn worker_loop(&self) {
        debug!("worker started");
        while let Some(task) = self.next_task() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
                error!(panic = panic_message(&*payload), "pool task panicked");
            }
        }
        debug!("worker stopped");
    }

    /// Blocks until a task is pending or the pool is terminating. Pending
    /// tasks are left in place on termination for `destroy` to cancel.
    fn next_task(&self) -> Option<PoolTask> {
        let mut state = self.state.lock();
        loop {
            if state.terminating {
                return None;
            }
            if let Some(task) = state.pending.pop_front() {
                return Some(task);
            }
            self.available.wait(&mut state);
        }
    }
}

impl Schedule for ThreadPool {
    fn schedule(&self, task: PoolTask) -> Result<(), PoolError> {
        let mut state = self.shared.state.lock();
        if state.terminating {
            return Err(PoolError::ShuttingDown);
        }
        state.pending.push_back(task);
        drop(state);
        self.shared.available.notify_one();
        Ok(())
    }

    fn reschedule(&self, task: PoolTask) -> Result<(), PoolTask> {
        let mut state = self.shared.state.lock();
        if state.drained {
            return Err(task);
        }
        state.pending.push_back(task);
        drop(state);
        self.shared.available.notify_one();
        Ok(())
    }
}

impl Pool for ThreadPool {
    fn destroy(&self, cancel: &mut dyn FnMut(PoolTask)) {
        {
            let mut state = self.shared.state.lock();
            if state.terminating {
                return;
            }
            state.terminating = true;
        }
        self.shared.available.notify_all();

        let current = thread::current().id();
        let handles = mem::take(&mut *self.handles.lock());
        for (id, handle) in handles {
            if id == current {
                // Destroyed from one of our own workers: it exits once the
                // running task returns, and anything it reschedules after the
                // drain below is handed back to it.
                debug!("thread pool destroyed from its own worker");
                continue;
            }
            if handle.join().is_err() {
                warn!(?id, "worker thread panicked");
            }
        }

        let pending = {
            let mut state = self.shared.state.lock();
            state.drained = true;
            mem::take(&mut state.pending)
        };
        if !pending.is_empty() {
            debug!(count = pending.len(), "canceling pending pool tasks");
        }
        for task in pending {
            cancel(task);
        }
        info!(nthreads = self.nthreads, "thread pool destroyed");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.destroy(&mut |_: PoolTask| {});
    }
}
