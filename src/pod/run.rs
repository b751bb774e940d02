use crate::{
    barrier::{CountdownBarrier, DependentBarrier},
    pod::Action,
    sync::Arc,
    types::{PodId, PodState, StateCell},
};
use core::any::Any;
use tracing::{debug, debug_span, error, trace};

/// Signals every dependent barrier when dropped, then marks the pod
/// `Completed`.
///
/// Dropping is the only way out of a pod thread, including unwinding out of
/// a panicking action and a spawn failure that discards the thread body, so
/// each dependent is signaled exactly once on every path.
pub(super) struct CompletionGuard {
    pub(super) pod: PodId,
    pub(super) dependents: Vec<DependentBarrier>,
    pub(super) state: StateCell,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        for (idx, dependent) in self.dependents.iter().enumerate() {
            trace!(pod = %self.pod, idx, "signaling dependent");
            dependent.signal();
        }
        self.state.set(PodState::Completed);
    }
}

/// Body of a pod thread.
///
/// 1. Park on the personal barrier, if any.
/// 2. Run the action once.
/// 3. Signal dependents (via `completion`, whatever the action did).
pub(super) fn pod_main(
    barrier: Option<Arc<CountdownBarrier>>,
    action: Option<Action>,
    completion: CompletionGuard,
) -> anyhow::Result<()> {
    let span = debug_span!("pod", id = %completion.pod);
    let _entered = span.enter();

    if let Some(barrier) = &barrier {
        completion.state.set(PodState::Waiting);
        debug!(remaining = barrier.remaining(), "waiting for dependencies");
        barrier.wait();
    }
    // Nobody waits on this barrier any more.
    drop(barrier);

    completion.state.set(PodState::Running);
    debug!("running action");
    let outcome = match action {
        Some(action) => action(),
        None => Ok(()),
    };
    if let Err(err) = &outcome {
        let chain = format!("{err:#}");
        error!(error = %chain, "action failed");
    }

    let dependents = completion.dependents.len();
    drop(completion);
    debug!(dependents, "completed");
    outcome
}

pub(super) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_owned()
    }
}
