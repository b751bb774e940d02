use crate::types::PodId;
use thiserror::Error;

/// Failure scoped to a single pod.
///
/// None of these stop the rest of the graph: a pod always signals its
/// dependents, even when its own action failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PodError {
    /// The action returned an error.
    #[error("action of pod {pod} failed")]
    Action {
        /// Pod whose action failed.
        pod: PodId,
        /// Error returned by the action.
        #[source]
        source: anyhow::Error,
    },
    /// The action panicked.
    #[error("action of pod {pod} panicked: {message}")]
    Panicked {
        /// Pod whose action panicked.
        pod: PodId,
        /// Panic payload, if it was a string.
        message: String,
    },
    /// The pod thread could not be started. The action never ran.
    #[error("failed to spawn thread for pod {pod}")]
    Spawn {
        /// Pod that could not be started.
        pod: PodId,
        /// Error reported by the OS.
        #[source]
        source: std::io::Error,
    },
    /// A declared dependency count disagreed with the dependency list.
    #[error("pod {pod} declares {declared} dependencies but waits for {actual}")]
    DependencyCountMismatch {
        /// Pod being constructed.
        pod: PodId,
        /// Count passed by the caller.
        declared: usize,
        /// Length of the dependency list.
        actual: usize,
    },
}

impl PodError {
    /// Pod the error belongs to.
    #[must_use]
    pub fn pod(&self) -> PodId {
        match self {
            Self::Action { pod, .. }
            | Self::Panicked { pod, .. }
            | Self::Spawn { pod, .. }
            | Self::DependencyCountMismatch { pod, .. } => *pod,
        }
    }
}
