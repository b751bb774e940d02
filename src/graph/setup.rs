use crate::{
    pod::TaskPod,
    types::{HashMap, IndexMap, PodId},
};
use rustc_hash::FxBuildHasher;
use std::collections::VecDeque;
use thiserror::Error;

/// Error kind for graph validation failures.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GraphSetupError {
    /// The dependency graph contains cycle(s).
    #[error("graph contains cycle(s)")]
    Cycle,
    /// Pods in a graph need an id for other pods to refer to them.
    #[error("anonymous pods cannot be added to a graph")]
    AnonymousPod,
    /// A pod was wired by hand before being added.
    #[error("pod {0} already has dependent barriers injected")]
    PrewiredPod(PodId),
    /// Two pods share the same id.
    #[error("pod {0} was added twice")]
    DuplicatePod(PodId),
    /// A pod waits for an id no pod in the graph carries.
    #[error("pod {pod} waits for unknown pod {dependency}")]
    UnknownDependency {
        /// Waiting pod.
        pod: PodId,
        /// Missing id.
        dependency: PodId,
    },
    /// A pod waits for itself.
    #[error("pod {0} waits for itself")]
    SelfDependency(PodId),
}

/// Check every edge and compute a topological order (Kahn).
///
/// Duplicate entries in a `wait_for` list count as separate edges, matching
/// the barrier size.
pub(super) fn topological_order(
    pods: &IndexMap<PodId, TaskPod>,
) -> Result<Vec<PodId>, GraphSetupError> {
    let mut children: HashMap<PodId, Vec<PodId>> =
        HashMap::with_capacity_and_hasher(pods.len(), FxBuildHasher);
    let mut pending: HashMap<PodId, usize> =
        HashMap::with_capacity_and_hasher(pods.len(), FxBuildHasher);

    for (&id, pod) in pods {
        for &dependency in pod.wait_for() {
            if dependency == id {
                return Err(GraphSetupError::SelfDependency(id));
            }
            if !pods.contains_key(&dependency) {
                return Err(GraphSetupError::UnknownDependency {
                    pod: id,
                    dependency,
                });
            }
            children.entry(dependency).or_default().push(id);
        }
        pending.insert(id, pod.dependency_count());
    }

    // Roots keep insertion order, which keeps the result stable.
    let mut ready: VecDeque<PodId> = pods
        .iter()
        .filter(|(_, pod)| pod.dependency_count() == 0)
        .map(|(&id, _)| id)
        .collect();
    if ready.is_empty() && !pods.is_empty() {
        // Every pod waits for something: all components are cyclic.
        return Err(GraphSetupError::Cycle);
    }

    let mut order = Vec::with_capacity(pods.len());
    while let Some(id) = ready.pop_front() {
        order.push(id);
        let Some(children) = children.get(&id) else {
            continue;
        };
        for child in children {
            let left = pending
                .get_mut(child)
                .expect("topological_order: [1]");
            *left -= 1;
            if *left == 0 {
                ready.push_back(*child);
            }
        }
    }

    if order.len() != pods.len() {
        // Whatever was never released sits on or behind a cycle.
        return Err(GraphSetupError::Cycle);
    }
    Ok(order)
}
