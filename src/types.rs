use crate::task::SubTask;
use std::sync::Arc;

/// Shared handle to a work unit.
///
/// Units are owned by whatever builds the task graph; the completion protocol
/// only clones and drops these handles.
pub type SubTaskRef = Arc<dyn SubTask>;

/// Terminal state reported to [`ExecSession::handle`].
///
/// [`ExecSession::handle`]: crate::executor::ExecSession::handle
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SessionState {
    /// The session ran: `execute` returned on a worker thread.
    Finished,
    /// The executor was torn down while the session was still queued;
    /// `execute` was never called.
    Canceled,
}
