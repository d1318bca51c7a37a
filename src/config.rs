use std::{num::NonZeroUsize, thread};

const DEFAULT_THREAD_NAME: &str = "seriesflow-worker";

/// Settings for an [`Executor`](crate::executor::Executor) and the
/// [`ThreadPool`](crate::pool::ThreadPool) it owns.
///
/// The defaults size the pool to the machine's available parallelism.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    nthreads: usize,
    thread_name: String,
    stack_size: Option<usize>,
}

impl ExecutorConfig {
    /// Config for a pool of `nthreads` workers. Zero is accepted here and
    /// rejected when the executor is created.
    pub fn new(nthreads: usize) -> Self {
        Self {
            nthreads,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
        }
    }

    /// Prefix for worker thread names; workers are named `{prefix}-{index}`.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    /// Stack size for worker threads, in bytes. Defaults to the platform's.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    #[must_use]
    pub fn nthreads(&self) -> usize {
        self.nthreads
    }

    #[must_use]
    pub fn thread_name_prefix(&self) -> &str {
        &self.thread_name
    }

    #[must_use]
    pub fn worker_stack_size(&self) -> Option<usize> {
        self.stack_size
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new(thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }
}
