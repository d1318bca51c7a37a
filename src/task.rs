mod parallel;

pub use crate::task::parallel::{JoinHandler, ParallelTask};
use crate::{
    sync::{Mutex, thread_local},
    types::SubTaskRef,
    utils::ScopeGuard,
};
use core::{cell::RefCell, fmt};
use std::{collections::VecDeque, sync::Arc};
use tracing::trace;

/// A single schedulable unit of work.
///
/// Units are chained into series by an external container: `done` pops the
/// next unit of the series. A unit may also be a child of a [`ParallelTask`],
/// which is recorded in its [`ParentLink`] for the duration of the join.
pub trait SubTask: Send + Sync + 'static {
    /// Begin execution, possibly asynchronously.
    ///
    /// Whoever observes the unit finishing must call [`subtask_done`] with it
    /// exactly once. That may happen on any thread, including synchronously
    /// from inside `dispatch`.
    fn dispatch(self: Arc<Self>);

    /// Unit-specific completion, invoked exactly once per dispatch by
    /// [`subtask_done`].
    ///
    /// Returns the next unit of the same series, or `None` when the series is
    /// exhausted at this point.
    fn done(self: Arc<Self>) -> Option<SubTaskRef>;

    /// The unit's join membership.
    fn parent(&self) -> &ParentLink;
}

/// Back-reference from a work unit to the join node it currently belongs to.
///
/// Set by the dispatcher before the unit is dispatched and taken by
/// [`subtask_done`], so a completed join is never reachable from its children.
pub struct ParentLink(Mutex<Option<Arc<ParallelTask>>>);

impl ParentLink {
    /// An unlinked slot.
    pub fn new() -> Self {
        Self(Mutex::new(None))
    }

    /// Whether the unit is currently a child of an unfinished join node.
    pub fn is_linked(&self) -> bool {
        self.0.lock().is_some()
    }

    pub(crate) fn set(&self, parent: Option<Arc<ParallelTask>>) {
        *self.0.lock() = parent;
    }

    pub(crate) fn take(&self) -> Option<Arc<ParallelTask>> {
        self.0.lock().take()
    }
}

impl Default for ParentLink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("linked", &self.is_linked())
            .finish()
    }
}

thread_local! {
    // Units completed re-entrantly while an outer `subtask_done` is active on
    // this thread. `None` when no call is active.
    static DEFERRED: RefCell<Option<VecDeque<SubTaskRef>>> = RefCell::new(None);
}

/// Reports that `task` has finished and advances the graph past it.
///
/// Runs the unit's `done`, then either dispatches the next unit of its series
/// (which inherits the unit's join membership) or counts the unit out of its
/// join node. The thread whose decrement brings the join to zero continues
/// with the join node itself, so a join's completion runs exactly once no
/// matter which child finishes last.
///
/// Stack usage is bounded independently of series length and join nesting:
/// propagation through joins is a loop, and a call made while another
/// `subtask_done` is already running on this thread (a `dispatch` that
/// completes synchronously) is queued and drained by the outer call.
pub fn subtask_done(task: SubTaskRef) {
    let Some(task) = enter(task) else {
        return;
    };
    let _guard = ScopeGuard::new(|| {
        let leftover = DEFERRED.with(|deferred| deferred.borrow_mut().take());
        drop(leftover);
    });

    let mut next = Some(task);
    while let Some(task) = next {
        advance(task);
        next = DEFERRED.with(|deferred| {
            deferred
                .borrow_mut()
                .as_mut()
                .and_then(VecDeque::pop_front)
        });
    }
}

/// Claims this thread's trampoline, or queues `task` behind the call that
/// already holds it.
fn enter(task: SubTaskRef) -> Option<SubTaskRef> {
    DEFERRED.with(|deferred| {
        let mut deferred = deferred.borrow_mut();
        match deferred.as_mut() {
            Some(queue) => {
                queue.push_back(task);
                None
            }
            None => {
                *deferred = Some(VecDeque::new());
                Some(task)
            }
        }
    })
}

fn advance(task: SubTaskRef) {
    let mut cur = task;
    loop {
        let parent = cur.parent().take();
        if let Some(next) = cur.done() {
            next.parent().set(parent);
            next.dispatch();
            return;
        }
        let Some(parent) = parent else {
            return;
        };
        if !parent.child_done() {
            return;
        }
        trace!(subtasks = parent.subtasks_nr(), "join node completed");
        cur = parent;
    }
}
