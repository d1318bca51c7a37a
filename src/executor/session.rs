use crate::{executor::ExecQueue, types::SessionState};
use std::sync::Arc;

/// `error` passed to [`ExecSession::handle`] when `execute` panicked. The
/// state is still [`SessionState::Finished`] and the queue moves on.
pub const EXECUTE_PANICKED: i32 = -1;

/// Work submitted to an [`Executor`](crate::executor::Executor) through an
/// [`ExecQueue`].
pub trait ExecSession: Send + Sync + 'static {
    /// The session body. Runs on a pool worker with no queue lock held.
    fn execute(&self);

    /// Terminal notification, delivered exactly once per accepted request:
    /// [`SessionState::Finished`] right after `execute` returns, or
    /// [`SessionState::Canceled`] without `execute` if the executor was torn
    /// down while the session was still queued. `error` is an errno-style
    /// code; the executor itself reports `0`, or [`EXECUTE_PANICKED`].
    ///
    /// A panic escaping `handle` is logged by the worker; later sessions of
    /// the queue still run.
    fn handle(&self, state: SessionState, error: i32);

    /// Called when a request for this session is accepted, with the queue it
    /// was appended to. The queue is locked for the duration of the call, so
    /// implementations must not submit to it from here.
    fn bind_queue(&self, queue: &Arc<ExecQueue>) {
        let _ = queue;
    }
}
