use crate::sync::{Arc, AtomicUsize, Condvar, Mutex, MutexGuard, Ordering, Weak};
use derive_more::Debug;
use std::sync::PoisonError;
use tracing::warn;

/// Countdown gate owned by one pod.
///
/// Sized once at construction. Every dependency calls [`signal`] exactly once
/// after it finished; the gate opens when the count reaches zero and then
/// stays open.
///
/// The counter is an atomic so signalers never contend on the mutex unless
/// they are the one opening the gate. Every decrement is `AcqRel`, so the
/// decrements form a single release sequence and a waiter that observes zero
/// with `Acquire` sees every write its dependencies made before signaling.
///
/// [`signal`]: CountdownBarrier::signal
#[derive(Debug)]
pub struct CountdownBarrier {
    initial: usize,
    remaining: AtomicUsize,
    #[debug(skip)]
    lock: Mutex<()>,
    #[debug(skip)]
    released: Condvar,
}

impl CountdownBarrier {
    /// Create a barrier expecting `count` signals. A zero count is open.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            initial: count,
            remaining: AtomicUsize::new(count),
            lock: Mutex::new(()),
            released: Condvar::new(),
        }
    }

    /// Number of signals the barrier was sized for.
    #[must_use]
    pub fn initial_count(&self) -> usize {
        self.initial
    }

    /// Signals still missing before the barrier opens.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Whether every expected signal has arrived.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.remaining() == 0
    }

    /// Deliver one completion signal.
    ///
    /// Returns `true` if this signal opened the barrier. Signaling an open
    /// barrier means an edge was wired twice; the count stays at zero and
    /// the extra signal is dropped.
    pub fn signal(&self) -> bool {
        let mut current = self.remaining.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                warn!(
                    initial = self.initial,
                    "signal on an already open barrier ignored"
                );
                return false;
            }
            match self.remaining.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        if current != 1 {
            return false;
        }
        // Taking the lock orders this notification after any waiter that has
        // checked the counter but not yet parked on the condvar.
        let _guard = self.lock();
        self.released.notify_all();
        true
    }

    /// Block until the barrier opens. There is no timeout: a signal that
    /// never arrives parks the caller forever.
    pub fn wait(&self) {
        if self.is_open() {
            return;
        }
        let mut guard = self.lock();
        while !self.is_open() {
            guard = self
                .released
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the barrier opens or `timeout` elapses.
    ///
    /// Returns whether the barrier is open.
    #[cfg(not(feature = "loom"))]
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> bool {
        if self.is_open() {
            return true;
        }
        let deadline = std::time::Instant::now() + timeout;
        let mut guard = self.lock();
        while !self.is_open() {
            let now = std::time::Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .released
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to another pod's [`CountdownBarrier`], held by the pods it waits
/// for.
///
/// The handle does not keep the barrier alive. The owning pod holds the only
/// strong reference and moves it into its thread, so the barrier lives
/// exactly as long as someone may still wait on it. Signaling a barrier that
/// is already gone is a no-op.
#[derive(Debug, Clone)]
pub struct DependentBarrier(Weak<CountdownBarrier>);

impl DependentBarrier {
    pub(crate) fn new(barrier: &Arc<CountdownBarrier>) -> Self {
        Self(Arc::downgrade(barrier))
    }

    /// Deliver one completion signal if the barrier still exists.
    pub fn signal(&self) {
        if let Some(barrier) = self.0.upgrade() {
            barrier.signal();
        }
    }

    /// Whether the underlying barrier has not been released yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Signals still missing, or `None` once the barrier is released.
    #[must_use]
    pub fn remaining(&self) -> Option<usize> {
        self.0.upgrade().map(|barrier| barrier.remaining())
    }
}
