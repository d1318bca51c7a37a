//! Execution core of a series/parallel task-graph runtime.
//!
//! Two independent mechanisms live here:
//! - Graph completion. Work units ([`task::SubTask`]) are chained into series
//!   by an external container and grouped into fan-out/fan-in joins by
//!   [`task::ParallelTask`]. When a unit finishes, [`task::subtask_done`]
//!   advances its series or counts it out of its join with a lock-free
//!   decrement; exactly one finishing child continues past the join.
//!   Propagation is iterative, so neither long series nor deep joins grow
//!   the call stack.
//! - Serialized execution. [`executor::Executor`] multiplexes any number of
//!   [`executor::ExecQueue`]s onto one bounded thread pool. Sessions of one
//!   queue run strictly one at a time in submission order; different queues
//!   run concurrently. A queue occupies at most one pool task at a time and
//!   the running worker hands the remainder back to the pool instead of
//!   looping or recursing.
//!
//! Key modules:
//! - `task`: the work unit trait, join node and completion loop.
//! - `executor`: sessions, queues and the executor driving them.
//! - `pool`: the thread-pool seam (`Pool`/`Schedule`) and the fixed-size
//!   `ThreadPool` implementation.
//! - `config`: executor/pool settings.
//! - `types`: shared aliases and the session terminal state.
//!
//! Shutdown accounts for every accepted session exactly once: it either
//! finishes (`SessionState::Finished`) or is canceled while still queued
//! (`SessionState::Canceled`).

/// Executor and thread-pool settings.
pub mod config;
/// Per-queue serialized execution of sessions on a shared pool.
///
/// Contains the `ExecSession` contract, the `ExecQueue` FIFO and the
/// `Executor` scheduling loop with its teardown/cancellation path.
pub mod executor;
/// Thread-pool substrate: the `Pool`/`Schedule` traits the executor drives
/// and the bundled `ThreadPool`.
pub mod pool;
mod sync;
/// Work units, join nodes and the completion propagation loop.
///
/// Defines the `SubTask` trait (`dispatch`, `done`, `parent`), the
/// `ParallelTask` join node with its atomic outstanding-children counter, and
/// `subtask_done`, which every unit's completion funnels through.
pub mod task;
/// Shared types: the `SubTaskRef` handle and `SessionState`.
pub mod types;
mod utils;
