#![allow(dead_code)]

use parking_lot::Mutex;
use seriesflow::{
    executor::{ExecQueue, ExecSession, Executor},
    pool::ThreadPool,
    task::{ParentLink, SubTask, subtask_done},
    types::{SessionState, SubTaskRef},
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Weak,
        atomic::{AtomicUsize, Ordering},
        mpsc::Sender,
    },
    time::Duration,
};

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Ordered list of units; `done` of each member pops the next one.
#[derive(Default)]
pub struct Series {
    units: Mutex<VecDeque<SubTaskRef>>,
}

impl Series {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, unit: SubTaskRef) {
        self.units.lock().push_back(unit);
    }

    pub fn pop(&self) -> Option<SubTaskRef> {
        self.units.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.units.lock().len()
    }
}

/// Shared, append-only event log.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Unit that finishes synchronously from inside `dispatch`.
pub struct SyncTask {
    parent: ParentLink,
    series: Arc<Series>,
    dones: Arc<AtomicUsize>,
}

impl SyncTask {
    pub fn new(series: &Arc<Series>, dones: &Arc<AtomicUsize>) -> Arc<Self> {
        Arc::new(Self {
            parent: ParentLink::new(),
            series: Arc::clone(series),
            dones: Arc::clone(dones),
        })
    }
}

impl SubTask for SyncTask {
    fn dispatch(self: Arc<Self>) {
        subtask_done(self);
    }

    fn done(self: Arc<Self>) -> Option<SubTaskRef> {
        self.dones.fetch_add(1, Ordering::SeqCst);
        self.series.pop()
    }

    fn parent(&self) -> &ParentLink {
        &self.parent
    }
}

/// Unit whose completion is reported by the test itself.
pub struct ManualTask {
    parent: ParentLink,
    name: String,
    series: Option<Arc<Series>>,
    dispatched: AtomicUsize,
    log: Log,
}

impl ManualTask {
    pub fn new(name: &str, log: &Log) -> Arc<Self> {
        Self::build(name, log, None)
    }

    pub fn in_series(name: &str, log: &Log, series: &Arc<Series>) -> Arc<Self> {
        Self::build(name, log, Some(Arc::clone(series)))
    }

    fn build(name: &str, log: &Log, series: Option<Arc<Series>>) -> Arc<Self> {
        Arc::new(Self {
            parent: ParentLink::new(),
            name: name.to_owned(),
            series,
            dispatched: AtomicUsize::new(0),
            log: log.clone(),
        })
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }
}

impl SubTask for ManualTask {
    fn dispatch(self: Arc<Self>) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
    }

    fn done(self: Arc<Self>) -> Option<SubTaskRef> {
        self.log.push(format!("done {}", self.name));
        self.series.as_ref().and_then(|series| series.pop())
    }

    fn parent(&self) -> &ParentLink {
        &self.parent
    }
}

/// Session that records what happens to it and reports its terminal state
/// on a channel.
pub struct Probe {
    name: String,
    body: Box<dyn Fn() + Send + Sync>,
    executed: AtomicUsize,
    states: Mutex<Vec<SessionState>>,
    bound: Mutex<Option<Arc<ExecQueue>>>,
    report: Sender<(String, SessionState)>,
}

impl Probe {
    pub fn new(name: &str, report: &Sender<(String, SessionState)>) -> Arc<Self> {
        Self::with_body(name, report, || {})
    }

    pub fn with_body(
        name: &str,
        report: &Sender<(String, SessionState)>,
        body: impl Fn() + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            body: Box::new(body),
            executed: AtomicUsize::new(0),
            states: Mutex::new(Vec::new()),
            bound: Mutex::new(None),
            report: report.clone(),
        })
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn states(&self) -> Vec<SessionState> {
        self.states.lock().clone()
    }

    pub fn bound_to(&self, queue: &Arc<ExecQueue>) -> bool {
        self.bound
            .lock()
            .as_ref()
            .is_some_and(|bound| Arc::ptr_eq(bound, queue))
    }

    pub fn is_bound(&self) -> bool {
        self.bound.lock().is_some()
    }
}

impl ExecSession for Probe {
    fn execute(&self) {
        self.executed.fetch_add(1, Ordering::SeqCst);
        (self.body)();
    }

    fn handle(&self, state: SessionState, error: i32) {
        assert_eq!(error, 0);
        self.states.lock().push(state);
        let _ = self.report.send((self.name.clone(), state));
    }

    fn bind_queue(&self, queue: &Arc<ExecQueue>) {
        *self.bound.lock() = Some(Arc::clone(queue));
    }
}

/// Work unit whose body runs as a session on an executor queue; the session
/// outcome completes the unit.
pub struct ThreadTask {
    parent: ParentLink,
    me: Weak<ThreadTask>,
    executor: Arc<Executor<ThreadPool>>,
    queue: Arc<ExecQueue>,
    series: Option<Arc<Series>>,
    body: Box<dyn Fn() + Send + Sync>,
    state: Mutex<Option<SessionState>>,
    log: Log,
    name: String,
}

impl ThreadTask {
    pub fn new(
        name: &str,
        executor: &Arc<Executor<ThreadPool>>,
        queue: &Arc<ExecQueue>,
        series: Option<&Arc<Series>>,
        log: &Log,
        body: impl Fn() + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            parent: ParentLink::new(),
            me: me.clone(),
            executor: Arc::clone(executor),
            queue: Arc::clone(queue),
            series: series.cloned(),
            body: Box::new(body),
            state: Mutex::new(None),
            log: log.clone(),
            name: name.to_owned(),
        })
    }

    pub fn state(&self) -> Option<SessionState> {
        *self.state.lock()
    }
}

impl SubTask for ThreadTask {
    fn dispatch(self: Arc<Self>) {
        let executor = Arc::clone(&self.executor);
        let queue = Arc::clone(&self.queue);
        executor
            .request(self, &queue)
            .expect("executor accepts the request");
    }

    fn done(self: Arc<Self>) -> Option<SubTaskRef> {
        self.log.push(format!("done {}", self.name));
        self.series.as_ref().and_then(|series| series.pop())
    }

    fn parent(&self) -> &ParentLink {
        &self.parent
    }
}

impl ExecSession for ThreadTask {
    fn execute(&self) {
        self.log.push(format!("run {}", self.name));
        (self.body)();
    }

    fn handle(&self, state: SessionState, _error: i32) {
        *self.state.lock() = Some(state);
        if let Some(me) = self.me.upgrade() {
            subtask_done(me);
        }
    }
}
