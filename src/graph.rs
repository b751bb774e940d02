mod setup;

/// Error returned by `PodGraph::add` and `PodGraph::build` when the graph is
/// invalid.
pub use crate::graph::setup::GraphSetupError;
use crate::{
    barrier::DependentBarrier,
    config::PodConfig,
    graph::setup::topological_order,
    pod::{PodError, PodHandle, TaskPod},
    types::{HashMap, IndexMap, PodId},
};
use rustc_hash::FxBuildHasher;
use thiserror::Error;
use tracing::{debug, info};

/// Error returned by `GraphHandle::join` when one or more pods failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphRunError {
    /// Every pod failure of the run, in start order.
    #[error("{} pod(s) failed", .0.len())]
    Failed(Vec<PodError>),
}

/// Collects pods and wires their edges from the ids they wait for.
///
/// This is the checked way to use pods: unlike manual wiring, unknown ids,
/// duplicate ids, self-dependencies and cycles are rejected before any
/// thread is started instead of parking pods forever.
#[must_use]
#[derive(Debug, Default)]
pub struct PodGraph {
    pods: IndexMap<PodId, TaskPod>,
    config: PodConfig,
}

impl PodGraph {
    /// Empty graph using the default [`PodConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty graph whose pods run with `config`.
    pub fn with_config(config: PodConfig) -> Self {
        Self {
            pods: IndexMap::default(),
            config,
        }
    }

    /// Add a pod.
    ///
    /// `build` wires every edge itself, so pods must arrive without
    /// dependent barriers.
    ///
    /// # Errors
    /// [`GraphSetupError::AnonymousPod`], [`GraphSetupError::PrewiredPod`] or
    /// [`GraphSetupError::DuplicatePod`].
    pub fn add(&mut self, pod: TaskPod) -> Result<&mut Self, GraphSetupError> {
        let id = pod.id();
        if id.is_anonymous() {
            return Err(GraphSetupError::AnonymousPod);
        }
        if pod.dependent_count() > 0 {
            return Err(GraphSetupError::PrewiredPod(id));
        }
        if self.pods.contains_key(&id) {
            return Err(GraphSetupError::DuplicatePod(id));
        }
        self.pods.insert(id, pod);
        Ok(self)
    }

    /// Number of pods added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pods.len()
    }

    /// Whether no pod was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    /// Validate the graph and wire every edge.
    ///
    /// For each edge `A -> B` (B waits for A), B's barrier is injected into
    /// A once per occurrence of A in B's `wait_for`.
    ///
    /// # Errors
    /// Any [`GraphSetupError`] describing an invalid graph.
    pub fn build(self) -> Result<WiredGraph, GraphSetupError> {
        let Self { mut pods, config } = self;
        let order = topological_order(&pods)?;

        let edges: Vec<(PodId, DependentBarrier)> = pods
            .values()
            .filter_map(|pod| pod.barrier_handle().map(|barrier| (pod, barrier)))
            .flat_map(|(pod, barrier)| {
                pod.wait_for()
                    .iter()
                    .map(move |&dependency| (dependency, barrier.clone()))
            })
            .collect();
        debug!(pods = pods.len(), edges = edges.len(), "wiring graph");
        for (dependency, barrier) in edges {
            pods[&dependency].inject_dependent_barrier(barrier);
        }

        let position: HashMap<PodId, usize> = {
            let mut position = HashMap::with_capacity_and_hasher(order.len(), FxBuildHasher);
            position.extend(order.iter().enumerate().map(|(idx, &id)| (id, idx)));
            position
        };
        let mut pods: Vec<TaskPod> = pods.into_values().collect();
        pods.sort_by_key(|pod| position[&pod.id()]);

        Ok(WiredGraph { pods, config })
    }
}

/// A validated, fully wired graph, ready to run.
#[must_use]
#[derive(Debug)]
pub struct WiredGraph {
    /// Pods in topological order.
    pods: Vec<TaskPod>,
    config: PodConfig,
}

impl WiredGraph {
    /// Pod ids in the order they will be started. Every pod comes after all
    /// pods it waits for.
    pub fn order(&self) -> impl Iterator<Item = PodId> + '_ {
        self.pods.iter().map(TaskPod::id)
    }

    /// Number of pods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pods.len()
    }

    /// Whether the graph has no pods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    /// Start every pod, in topological order.
    ///
    /// A pod whose thread cannot be spawned is recorded as failed and still
    /// releases its dependents, so the rest of the graph keeps running.
    pub fn run(self) -> GraphHandle {
        let Self { pods, config } = self;
        info!(pods = pods.len(), "running graph");
        let mut handles = Vec::with_capacity(pods.len());
        let mut failures = Vec::new();
        for pod in pods {
            match pod.run_with(&config) {
                Ok(handle) => handles.push(handle),
                Err(err) => failures.push(err),
            }
        }
        GraphHandle { handles, failures }
    }
}

/// Owning handle of a running graph.
#[must_use]
#[derive(Debug)]
pub struct GraphHandle {
    handles: Vec<PodHandle>,
    failures: Vec<PodError>,
}

impl GraphHandle {
    /// Handles of the pods that were started.
    #[must_use]
    pub fn pods(&self) -> &[PodHandle] {
        &self.handles
    }

    /// Whether every started pod completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(PodHandle::is_finished)
    }

    /// Wait for every pod.
    ///
    /// # Errors
    /// [`GraphRunError::Failed`] with every pod failure, including pods that
    /// could not be started.
    pub fn join(self) -> Result<(), GraphRunError> {
        let Self {
            handles,
            mut failures,
        } = self;
        for handle in handles {
            if let Err(err) = handle.join() {
                failures.push(err);
            }
        }
        if failures.is_empty() {
            info!("graph completed");
            Ok(())
        } else {
            Err(GraphRunError::Failed(failures))
        }
    }
}
