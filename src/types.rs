use crate::sync::{Arc, AtomicU8, Ordering};
use core::fmt;
use derive_more::From;
use indexmap::IndexMap as _IndexMap;
use rustc_hash::FxBuildHasher;
use std::collections::HashMap as _HashMap;

/// Caller-assigned identifier of a pod.
///
/// Identifiers are bookkeeping only: they name threads and log spans, and
/// `PodGraph` uses them to wire edges. A pod never looks anything up by its
/// own id. [`PodId::ANONYMOUS`] marks a pod that was never given one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, From)]
#[repr(transparent)]
pub struct PodId(i32);

impl PodId {
    /// Sentinel for pods constructed without an identifier.
    pub const ANONYMOUS: Self = Self(-1);

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Whether this is the [`PodId::ANONYMOUS`] sentinel.
    #[must_use]
    pub const fn is_anonymous(self) -> bool {
        self.0 == Self::ANONYMOUS.0
    }
}

impl Default for PodId {
    fn default() -> Self {
        Self::ANONYMOUS
    }
}

impl fmt::Display for PodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            f.write_str("anon")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Lifecycle of a single pod.
///
/// `Waiting` is skipped by pods without dependencies. A failing action still
/// ends in `Completed`: failures are reported through the run handle, not
/// through the state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PodState {
    /// Built, no dependent barrier injected yet.
    Constructed = 0,
    /// At least one dependent barrier injected.
    Wired = 1,
    /// Thread started, blocked on the personal barrier.
    Waiting = 2,
    /// Action executing.
    Running = 3,
    /// Action finished and every dependent barrier signaled.
    Completed = 4,
}

impl PodState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Constructed,
            1 => Self::Wired,
            2 => Self::Waiting,
            3 => Self::Running,
            _ => Self::Completed,
        }
    }
}

/// Shared, atomically updated [`PodState`].
///
/// One copy lives in the pod (and later its handle), one in the pod thread.
#[derive(Debug, Clone)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(PodState::Constructed as u8)))
    }

    pub(crate) fn get(&self) -> PodState {
        PodState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: PodState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

pub(crate) type HashMap<K, V> = _HashMap<K, V, FxBuildHasher>;
/// `IndexMap` type with fast hasher.
pub type IndexMap<K, V> = _IndexMap<K, V, FxBuildHasher>;
