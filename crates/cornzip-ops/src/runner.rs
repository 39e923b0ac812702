//! The operation task runner.
//!
//! A [`TaskRunner`] owns at most one active run of its operation kind. Each
//! run publishes [`RunSnapshot`]s through a `watch` channel: pollers read the
//! latest snapshot, subscribers await changes. The engine's progress reaches
//! the snapshot through a bounded channel drained by a spawned driver task.
//! A driver that panics is failed by the task supervising it.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cornzip_core::{InputFileRef, PipelineConfig};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::{CodecEngine, EngineOutput, ProgressSink};
use crate::error::{EngineError, FailureReason, RunError};
use crate::operation::{OperationOptions, OperationResult};
use crate::plan::Plan;
use crate::progress::{OperationKind, OperationProgress, ProgressUpdate};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Default)]
pub enum RunState {
    /// Nothing has been started yet.
    #[default]
    Idle,
    /// The engine is working.
    Running,
    /// The run finished with a result.
    Completed(OperationResult),
    /// The run failed.
    Failed(FailureReason),
    /// The run was cancelled.
    Cancelled,
}

impl RunState {
    /// Whether the run can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_) | Self::Cancelled)
    }

    /// Whether the run is in progress.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Short name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    fn result(&self) -> Result<OperationResult, RunError> {
        match self {
            Self::Idle | Self::Running => Err(RunError::NotReady),
            Self::Completed(result) => Ok(result.clone()),
            Self::Failed(reason) => Err(RunError::OperationFailed(reason.clone())),
            Self::Cancelled => Err(RunError::Cancelled),
        }
    }
}

/// Observable state of one run.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    /// Identifier of the run, unique per runner.
    pub run_id: u64,
    /// Lifecycle state.
    pub state: RunState,
    /// Latest progress.
    pub progress: OperationProgress,
}

impl RunSnapshot {
    fn new(run_id: u64, kind: OperationKind, state: RunState) -> Self {
        Self {
            run_id,
            state,
            progress: OperationProgress::new(kind),
        }
    }
}

struct Current {
    next_id: u64,
    snapshot: watch::Receiver<RunSnapshot>,
    cancel: CancellationToken,
}

/// Runs operations of one kind, one at a time.
pub struct TaskRunner<E: CodecEngine> {
    kind: OperationKind,
    engine: Arc<E>,
    config: Arc<PipelineConfig>,
    current: Mutex<Current>,
}

impl<E: CodecEngine> std::fmt::Debug for TaskRunner<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("kind", &self.kind)
            .field("state", &self.state().name())
            .finish()
    }
}

impl<E: CodecEngine> TaskRunner<E> {
    /// Create an idle runner.
    pub fn new(kind: OperationKind, engine: Arc<E>, config: Arc<PipelineConfig>) -> Self {
        let (_, snapshot) = watch::channel(RunSnapshot::new(0, kind, RunState::Idle));
        Self {
            kind,
            engine,
            config,
            current: Mutex::new(Current {
                next_id: 1,
                snapshot,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// The operation kind this runner accepts.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// State of the latest run.
    pub fn state(&self) -> RunState {
        self.lock().snapshot.borrow().state.clone()
    }

    /// Progress of the latest run.
    pub fn progress(&self) -> OperationProgress {
        self.lock().snapshot.borrow().progress.clone()
    }

    /// Result of the latest run.
    pub fn result(&self) -> Result<OperationResult, RunError> {
        self.lock().snapshot.borrow().state.result()
    }

    /// Cancel the latest run if it is still running.
    pub fn cancel(&self) {
        self.lock().cancel.cancel();
    }

    /// Start a run.
    ///
    /// Rejected with [`RunError::OperationInProgress`] while a run is active;
    /// the active run is not affected. Invalid requests leave the runner in
    /// the failed state and return [`RunError::InvalidInput`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        inputs: Vec<InputFileRef>,
        options: impl Into<OperationOptions>,
    ) -> Result<OperationHandle, RunError> {
        let mut current = self.lock();
        if current.snapshot.borrow().state.is_running() {
            return Err(RunError::OperationInProgress);
        }

        let run_id = current.next_id;
        current.next_id += 1;

        let plan = match Plan::prepare(self.kind, inputs, options.into(), &self.config) {
            Ok(plan) => plan,
            Err(message) => {
                tracing::warn!(kind = %self.kind, run_id, %message, "rejected run");
                let state = RunState::Failed(FailureReason::InvalidInput(message.clone()));
                let (_, snapshot) = watch::channel(RunSnapshot::new(run_id, self.kind, state));
                current.snapshot = snapshot;
                current.cancel = CancellationToken::new();
                return Err(RunError::InvalidInput(message));
            }
        };

        let (tx, rx) = watch::channel(RunSnapshot::new(run_id, self.kind, RunState::Running));
        let cancel = CancellationToken::new();
        current.snapshot = rx.clone();
        current.cancel = cancel.clone();
        drop(current);

        tracing::info!(kind = %self.kind, run_id, "starting run");

        let tx = Arc::new(tx);
        let driver = Driver {
            run_id,
            plan,
            snapshot: Arc::clone(&tx),
            cancel: cancel.clone(),
            timeout: self.config.timeout(),
            capacity: self.config.progress_capacity,
        };
        let task = tokio::spawn(driver.run(Arc::clone(&self.engine)));
        tokio::spawn(supervise(self.kind, run_id, task, tx));

        Ok(OperationHandle {
            run_id,
            kind: self.kind,
            snapshot: rx,
            cancel,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Current> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum Outcome {
    Finished(Result<EngineOutput, EngineError>),
    Cancelled,
    TimedOut(Duration),
}

/// Drives one run from start to a terminal state.
struct Driver {
    run_id: u64,
    plan: Plan,
    snapshot: Arc<watch::Sender<RunSnapshot>>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
    capacity: usize,
}

impl Driver {
    async fn run<E: CodecEngine>(mut self, engine: Arc<E>) {
        let (sink, mut updates) = ProgressSink::channel(self.capacity);
        let job = self.plan.job();
        let cancel = self.cancel.clone();
        let timeout = self.timeout;

        let outcome = {
            let work = engine.run(job, sink);
            tokio::pin!(work);
            let deadline = deadline(timeout);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break Outcome::Cancelled,
                    limit = &mut deadline => break Outcome::TimedOut(limit),
                    Some(update) = updates.recv() => self.apply(update),
                    result = &mut work => {
                        while let Ok(update) = updates.try_recv() {
                            self.apply(update);
                        }
                        break Outcome::Finished(result);
                    }
                }
            }
        };

        self.settle(outcome);
    }

    fn apply(&mut self, update: ProgressUpdate) {
        let plan = &mut self.plan;
        self.snapshot.send_if_modified(|snapshot| {
            let changed = snapshot.progress.advance(update);
            if changed {
                plan.observe(snapshot.progress.percent);
            }
            changed
        });
    }

    fn settle(self, outcome: Outcome) {
        let run_id = self.run_id;
        let kind = self.plan.kind();

        let state = match outcome {
            Outcome::Finished(Ok(output)) => match self.plan.finish(output) {
                Ok(result) => {
                    tracing::info!(%kind, run_id, summary = %result.summary(), "run completed");
                    RunState::Completed(result)
                }
                Err(reason) => {
                    tracing::warn!(%kind, run_id, %reason, "run failed");
                    RunState::Failed(reason)
                }
            },
            Outcome::Finished(Err(err)) => {
                tracing::warn!(%kind, run_id, error = %err, "run failed");
                RunState::Failed(FailureReason::Engine(err.to_string()))
            }
            Outcome::TimedOut(limit) => {
                tracing::warn!(%kind, run_id, ?limit, "run timed out");
                RunState::Failed(FailureReason::Timeout(limit))
            }
            Outcome::Cancelled => {
                tracing::info!(%kind, run_id, "run cancelled");
                RunState::Cancelled
            }
        };

        self.snapshot.send_modify(|snapshot| {
            if matches!(state, RunState::Completed(_)) {
                snapshot.progress.complete();
            } else {
                snapshot.progress.reset();
            }
            snapshot.state = state;
        });
    }
}

/// Fails a run whose driver died before settling it.
async fn supervise(
    kind: OperationKind,
    run_id: u64,
    task: JoinHandle<()>,
    snapshot: Arc<watch::Sender<RunSnapshot>>,
) {
    let Err(err) = task.await else {
        return;
    };
    if !err.is_panic() {
        return;
    }

    tracing::error!(%kind, run_id, "engine panicked");
    snapshot.send_if_modified(|snapshot| {
        if snapshot.state.is_terminal() {
            return false;
        }
        snapshot.progress.reset();
        snapshot.state = RunState::Failed(FailureReason::Engine("engine panicked".to_string()));
        true
    });
}

fn deadline(timeout: Option<Duration>) -> impl Future<Output = Duration> {
    async move {
        match timeout {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                limit
            }
            None => std::future::pending().await,
        }
    }
}

/// Handle to one started run.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    run_id: u64,
    kind: OperationKind,
    snapshot: watch::Receiver<RunSnapshot>,
    cancel: CancellationToken,
}

impl OperationHandle {
    /// Identifier of the run.
    pub fn id(&self) -> u64 {
        self.run_id
    }

    /// The operation kind.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.snapshot.borrow().state.clone()
    }

    /// Current progress.
    pub fn progress(&self) -> OperationProgress {
        self.snapshot.borrow().progress.clone()
    }

    /// The result, or why there is none.
    pub fn result(&self) -> Result<OperationResult, RunError> {
        self.snapshot.borrow().state.result()
    }

    /// Subscribe to progress changes.
    pub fn subscribe(&self) -> ProgressSubscription {
        ProgressSubscription {
            snapshot: self.snapshot.clone(),
            started: false,
            finished: false,
        }
    }

    /// Request cancellation. Has no effect once the run is terminal.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to become terminal and return its result.
    pub async fn wait(&self) -> Result<OperationResult, RunError> {
        let mut snapshot = self.snapshot.clone();
        // An error means the driver is gone; report the state it left.
        let _ = snapshot.wait_for(|s| s.state.is_terminal()).await;
        self.result()
    }
}

/// Stream of progress values for one run.
///
/// Yields the current progress first, then each change. Intermediate values
/// may be skipped but never arrive out of order. On completion the last value
/// is 100%; a failed or cancelled run ends without a final value.
#[derive(Debug)]
pub struct ProgressSubscription {
    snapshot: watch::Receiver<RunSnapshot>,
    started: bool,
    finished: bool,
}

impl ProgressSubscription {
    /// The next progress value, or `None` once the run has ended.
    pub async fn next(&mut self) -> Option<OperationProgress> {
        if self.finished {
            return None;
        }
        if self.started && self.snapshot.changed().await.is_err() {
            self.finished = true;
            return None;
        }
        self.started = true;

        let snapshot = self.snapshot.borrow_and_update().clone();
        match snapshot.state {
            RunState::Running => Some(snapshot.progress),
            RunState::Completed(_) => {
                self.finished = true;
                Some(snapshot.progress)
            }
            RunState::Idle | RunState::Failed(_) | RunState::Cancelled => {
                self.finished = true;
                None
            }
        }
    }
}
