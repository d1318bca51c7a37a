use crate::{
    sync::{AtomicUsize, Ordering, fence},
    task::{ParentLink, SubTask, subtask_done},
    types::SubTaskRef,
};
use core::fmt;
use std::sync::Arc;

/// Completion behaviour of a [`ParallelTask`], run once every child of the
/// current dispatch has finished.
pub trait JoinHandler: Send + Sync + 'static {
    /// Returns the unit that follows the join node in its series, if any.
    fn done(&self, task: &ParallelTask) -> Option<SubTaskRef>;
}

impl<F> JoinHandler for F
where
    F: Fn(&ParallelTask) -> Option<SubTaskRef> + Send + Sync + 'static,
{
    fn done(&self, task: &ParallelTask) -> Option<SubTaskRef> {
        self(task)
    }
}

/// A work unit that fans out to a fixed, ordered set of children and
/// completes once all of them have.
///
/// Completion is decided by `nleft`: every child whose series runs out
/// decrements it, and only the decrement that observes the transition to
/// zero proceeds past the join. No lock is involved.
///
/// A join with no children completes from inside `dispatch`. If that
/// `dispatch` runs within a [`subtask_done`] call on the same thread (the
/// join follows a finishing unit in its series, for instance), the
/// completion is queued instead and runs right after `dispatch` returns,
/// still before the enclosing `subtask_done` returns.
pub struct ParallelTask {
    subtasks: Box<[SubTaskRef]>,
    nleft: AtomicUsize,
    parent: ParentLink,
    handler: Box<dyn JoinHandler>,
}

impl ParallelTask {
    /// Builds a join node over `subtasks`. `handler` runs when the join
    /// completes and picks the next unit of the join node's own series.
    pub fn new(
        subtasks: impl IntoIterator<Item = SubTaskRef>,
        handler: impl JoinHandler,
    ) -> Arc<Self> {
        let subtasks: Box<[SubTaskRef]> = subtasks.into_iter().collect();
        Arc::new(Self {
            nleft: AtomicUsize::new(subtasks.len()),
            subtasks,
            parent: ParentLink::new(),
            handler: Box::new(handler),
        })
    }

    #[must_use]
    pub fn subtasks(&self) -> &[SubTaskRef] {
        &self.subtasks
    }

    #[must_use]
    pub fn subtasks_nr(&self) -> usize {
        self.subtasks.len()
    }

    /// Children of the current dispatch that have not finished yet.
    #[must_use]
    pub fn nleft(&self) -> usize {
        self.nleft.load(Ordering::Relaxed)
    }

    /// Counts one child out. Returns `true` for exactly one caller per
    /// dispatch: the one that took `nleft` to zero.
    pub(super) fn child_done(&self) -> bool {
        // Release publishes this child's effects; the winner's Acquire fence
        // makes every sibling's effects visible before the join proceeds.
        if self.nleft.fetch_sub(1, Ordering::Release) != 1 {
            return false;
        }
        fence(Ordering::Acquire);
        true
    }
}

impl SubTask for ParallelTask {
    fn dispatch(self: Arc<Self>) {
        let subtasks_nr = self.subtasks.len();
        self.nleft.store(subtasks_nr, Ordering::Relaxed);
        if subtasks_nr == 0 {
            subtask_done(self);
            return;
        }
        for subtask in self.subtasks.iter() {
            subtask.parent().set(Some(Arc::clone(&self)));
            Arc::clone(subtask).dispatch();
        }
    }

    fn done(self: Arc<Self>) -> Option<SubTaskRef> {
        self.handler.done(&self)
    }

    fn parent(&self) -> &ParentLink {
        &self.parent
    }
}

impl fmt::Debug for ParallelTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelTask")
            .field("subtasks_nr", &self.subtasks_nr())
            .field("nleft", &self.nleft())
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}
