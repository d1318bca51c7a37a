use crate::{executor::ExecSession, pool::Schedule, sync::Mutex};
use core::fmt;
use derive_more::Debug;
use std::{collections::VecDeque, sync::Arc};

/// A FIFO of sessions that run strictly one at a time, in submission order.
///
/// Any number of queues can share one executor; sessions from different
/// queues run concurrently, sessions from the same queue never overlap. The
/// lock only guards the list and is never held while a session runs.
pub struct ExecQueue {
    pub(super) sessions: Mutex<VecDeque<QueueEntry>>,
}

/// A queued session bound to the pool that must run it.
#[derive(Debug)]
pub(super) struct QueueEntry {
    #[debug(skip)]
    pub(super) session: Arc<dyn ExecSession>,
    #[debug(skip)]
    pub(super) pool: Arc<dyn Schedule>,
}

impl ExecQueue {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(VecDeque::new()),
        }
    }

    /// Sessions accepted and not yet finished, including the one running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl Default for ExecQueue {
    fn default() -> Self {
        Self::new()
    }
}

// Must not take the queue lock: queues are formatted under the pool's state
// lock (queue -> pool is the only allowed order).
impl fmt::Debug for ExecQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecQueue").finish_non_exhaustive()
    }
}
