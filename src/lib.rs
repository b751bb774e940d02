//! Dependency-ordered, one-shot task runner built from per-task countdown
//! barriers.
//!
//! Every unit of work is a [`TaskPod`](pod::TaskPod): an action, the ids of
//! the pods it waits for, and a personal countdown barrier sized from that
//! list. Running a pod spawns a dedicated thread that:
//! - parks on the personal barrier until every dependency signaled,
//! - runs the action exactly once,
//! - signals the barriers of the pods waiting on it, whatever the action did.
//!
//! Key modules:
//! - `pod`: the pod itself, its run handle and its errors.
//! - `barrier`: the countdown barrier and the weak handle dependencies use to
//!   signal it.
//! - `graph`: optional builder that wires edges from ids, rejects invalid
//!   graphs (cycles, unknown ids) and joins the whole run.
//! - `config`: thread naming and stack size.
//! - `types`: `PodId`, `PodState` and hash map aliases.
//!
//! Manual use:
//! 1. Construct one pod per unit of work.
//! 2. For every edge `A -> B` (B waits for A), inject `B.barrier_handle()`
//!    into `A` (or call `B.depends_on(&mut A)`).
//! 3. Run every pod and join the returned handles.
//!
//! Wiring must be complete before the pods run; `TaskPod::run` consumes the
//! pod, which enforces that. A missing edge or a cycle parks the affected
//! pods forever; use `graph::PodGraph` to have both rejected up front.

/// Countdown barrier gating a pod, and the weak handle used to signal it.
pub mod barrier;
/// Configuration of pod threads.
pub mod config;
/// Checked graph construction on top of pods.
///
/// Wires every edge from the pods' `wait_for` ids, validates the graph
/// (unknown or duplicate ids, self-dependencies, cycles) and runs all pods
/// in topological order.
pub mod graph;
#[cfg(feature = "logging")]
pub mod logging;
/// The pod: a unit of work plus its synchronization state.
///
/// Defines `TaskPod`, the `PodHandle` returned when it runs, and
/// `PodError`.
pub mod pod;
mod sync;
/// Identifiers, lifecycle states and collection aliases.
pub mod types;
