mod error;
mod run;

/// Failure scoped to a single pod: a failing or panicking action, a thread
/// that could not be spawned, or an inconsistent construction.
pub use crate::pod::error::PodError;
use crate::{
    barrier::{CountdownBarrier, DependentBarrier},
    config::PodConfig,
    pod::run::{CompletionGuard, panic_message, pod_main},
    sync::{self, Arc, JoinHandle},
    types::{PodId, PodState, StateCell},
};
use derive_more::Debug;
use tracing::{debug, warn};

pub(crate) type Action = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// One unit of deferred work plus the synchronization needed to order it.
///
/// A pod waits on its personal [`CountdownBarrier`], sized from the number of
/// ids it waits for, and signals the barriers of the pods that wait on it.
/// Wiring is manual: for every edge `A -> B` (B waits for A), inject
/// `B.barrier_handle()` into `A` before running either of them.
///
/// [`TaskPod::run`] consumes the pod, so no edge can be added once a pod has
/// started. Cycles and missing edges are not detected here; they leave the
/// affected pods parked forever. `PodGraph` validates both up front.
#[must_use]
#[derive(Debug)]
pub struct TaskPod {
    id: PodId,
    /// Ids this pod waits for. The only source of the barrier size.
    wait_for: Vec<PodId>,
    /// Present iff `wait_for` is non-empty.
    barrier: Option<Arc<CountdownBarrier>>,
    /// Barriers of pods waiting on this one.
    dependents: Vec<DependentBarrier>,
    #[debug(skip)]
    action: Option<Action>,
    state: StateCell,
}

impl TaskPod {
    /// Pod running `action` once every pod in `wait_for` has signaled.
    pub fn new(
        id: impl Into<PodId>,
        wait_for: impl IntoIterator<Item = PodId>,
        action: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self::from_parts(
            id.into(),
            wait_for.into_iter().collect(),
            Some(Box::new(move || -> anyhow::Result<()> {
                action();
                Ok(())
            })),
        )
    }

    /// Like [`TaskPod::new`], with [`PodId::ANONYMOUS`] as id.
    pub fn anonymous(
        wait_for: impl IntoIterator<Item = PodId>,
        action: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self::new(PodId::ANONYMOUS, wait_for, action)
    }

    /// Pod whose action may fail. The error is reported by
    /// [`PodHandle::join`]; dependents are signaled either way.
    pub fn fallible(
        id: impl Into<PodId>,
        wait_for: impl IntoIterator<Item = PodId>,
        action: impl FnOnce() -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        Self::from_parts(id.into(), wait_for.into_iter().collect(), Some(Box::new(action)))
    }

    /// Pod without an action, useful as a join point.
    pub fn join_point(id: impl Into<PodId>, wait_for: impl IntoIterator<Item = PodId>) -> Self {
        Self::from_parts(id.into(), wait_for.into_iter().collect(), None)
    }

    /// Construction with an explicitly declared dependency count.
    ///
    /// The barrier is still sized from `wait_for`; `declared` only has to
    /// agree with it.
    ///
    /// # Errors
    /// [`PodError::DependencyCountMismatch`] if `declared != wait_for.len()`.
    pub fn with_declared_dependencies(
        id: impl Into<PodId>,
        declared: usize,
        wait_for: impl IntoIterator<Item = PodId>,
        action: impl FnOnce() + Send + 'static,
    ) -> Result<Self, PodError> {
        let pod = Self::new(id, wait_for, action);
        if pod.wait_for.len() != declared {
            return Err(PodError::DependencyCountMismatch {
                pod: pod.id,
                declared,
                actual: pod.wait_for.len(),
            });
        }
        Ok(pod)
    }

    fn from_parts(id: PodId, wait_for: Vec<PodId>, action: Option<Action>) -> Self {
        let barrier = (!wait_for.is_empty())
            .then(|| Arc::new(CountdownBarrier::new(wait_for.len())));
        Self {
            id,
            wait_for,
            barrier,
            dependents: Vec::new(),
            action,
            state: StateCell::new(),
        }
    }

    /// Caller-assigned id.
    #[must_use]
    pub fn id(&self) -> PodId {
        self.id
    }

    /// Ids this pod waits for, in declaration order.
    #[must_use]
    pub fn wait_for(&self) -> &[PodId] {
        &self.wait_for
    }

    /// Number of signals the pod waits for.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.wait_for.len()
    }

    /// Number of dependent barriers injected so far.
    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.dependents.len()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PodState {
        self.state.get()
    }

    /// Handle to inject into each pod this one waits for, or `None` if it
    /// waits for nothing.
    #[must_use]
    pub fn barrier_handle(&self) -> Option<DependentBarrier> {
        self.barrier.as_ref().map(DependentBarrier::new)
    }

    /// Register the barrier of a pod that waits for this one.
    ///
    /// Not deduplicated: injecting the same barrier twice signals it twice.
    pub fn inject_dependent_barrier(&mut self, barrier: DependentBarrier) {
        self.dependents.push(barrier);
        if self.state.get() == PodState::Constructed {
            self.state.set(PodState::Wired);
        }
    }

    /// Wire the edge `dependency -> self`.
    pub fn depends_on(&self, dependency: &mut TaskPod) {
        match self.barrier_handle() {
            Some(barrier) => dependency.inject_dependent_barrier(barrier),
            None => warn!(
                pod = %self.id,
                dependency = %dependency.id,
                "pod waits for nothing, edge not wired"
            ),
        }
    }

    /// Start the pod on its own thread with the default [`PodConfig`].
    ///
    /// # Errors
    /// See [`TaskPod::run_with`].
    pub fn run(self) -> Result<PodHandle, PodError> {
        self.run_with(&PodConfig::default())
    }

    /// Start the pod on its own thread and return immediately.
    ///
    /// # Errors
    /// [`PodError::Spawn`] if the thread could not be created. The action
    /// never runs in that case, but the dependents are still signaled.
    pub fn run_with(self, config: &PodConfig) -> Result<PodHandle, PodError> {
        let Self {
            id,
            wait_for,
            barrier,
            dependents,
            action,
            state,
        } = self;
        debug!(
            pod = %id,
            dependencies = wait_for.len(),
            dependents = dependents.len(),
            "starting pod"
        );
        let completion = CompletionGuard {
            pod: id,
            dependents,
            state: state.clone(),
        };
        // On failure the thread body is dropped unrun, and with it
        // `completion`, which releases the dependents.
        match sync::spawn(config.thread_name(id), config.stack_size(), move || {
            pod_main(barrier, action, completion)
        }) {
            Ok(inner) => Ok(PodHandle { id, state, inner }),
            Err(source) => {
                warn!(pod = %id, error = %source, "failed to spawn pod thread");
                Err(PodError::Spawn { pod: id, source })
            }
        }
    }
}

/// Owning handle of a running pod.
///
/// Dropping the handle detaches the thread; the pod still runs to
/// completion.
#[must_use]
#[derive(Debug)]
pub struct PodHandle {
    id: PodId,
    state: StateCell,
    #[debug(skip)]
    inner: JoinHandle<anyhow::Result<()>>,
}

impl PodHandle {
    /// Id of the running pod.
    #[must_use]
    pub fn id(&self) -> PodId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PodState {
        self.state.get()
    }

    /// Whether the action finished and the dependents were signaled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.get() == PodState::Completed
    }

    /// Wait for the pod thread to end.
    ///
    /// Blocks forever if the pod never gets all its signals.
    ///
    /// # Errors
    /// [`PodError::Action`] if the action returned an error,
    /// [`PodError::Panicked`] if it panicked.
    pub fn join(self) -> Result<(), PodError> {
        let Self { id, inner, .. } = self;
        match inner.join() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(PodError::Action { pod: id, source }),
            Err(payload) => Err(PodError::Panicked {
                pod: id,
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}
