#![allow(dead_code)]

use std::sync::{
    Arc, Mutex, Once,
    atomic::{AtomicUsize, Ordering},
};
use taskpod::types::PodId;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Output is captured per test and only shown for failures. Enable levels
/// with e.g. `RUST_LOG=taskpod=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_names(true)
            .init();
    });
}

pub fn pid(raw: i32) -> PodId {
    PodId::new(raw)
}

/// Logical clock handing out strictly increasing stamps.
#[derive(Debug, Clone, Default)]
pub struct Clock(Arc<AtomicUsize>);

impl Clock {
    pub fn tick(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// Start/finish stamps and run counts per pod, indexed by id.
#[derive(Debug, Clone)]
pub struct Journal {
    clock: Clock,
    entries: Arc<Mutex<Vec<Entry>>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Entry {
    pub runs: usize,
    pub started: Option<usize>,
    pub finished: Option<usize>,
}

impl Journal {
    pub fn new(pods: usize) -> Self {
        Self {
            clock: Clock::default(),
            entries: Arc::new(Mutex::new(vec![Entry::default(); pods])),
        }
    }

    /// Action recording a start stamp, optionally sleeping, then a finish
    /// stamp.
    pub fn action(&self, id: usize, busy_ms: u64) -> impl FnOnce() + Send + use<> {
        let journal = self.clone();
        move || {
            let started = journal.clock.tick();
            {
                let mut entries = journal.entries.lock().unwrap();
                entries[id].runs += 1;
                entries[id].started = Some(started);
            }
            if busy_ms > 0 {
                std::thread::sleep(std::time::Duration::from_millis(busy_ms));
            }
            let finished = journal.clock.tick();
            journal.entries.lock().unwrap()[id].finished = Some(finished);
        }
    }

    pub fn entry(&self, id: usize) -> Entry {
        self.entries.lock().unwrap()[id]
    }

    /// Assert `child` started after `parent` finished.
    pub fn assert_after(&self, parent: usize, child: usize) {
        let parent_entry = self.entry(parent);
        let child_entry = self.entry(child);
        let finished = parent_entry
            .finished
            .unwrap_or_else(|| panic!("pod {parent} never finished"));
        let started = child_entry
            .started
            .unwrap_or_else(|| panic!("pod {child} never started"));
        assert!(
            finished < started,
            "pod {child} started at {started} before pod {parent} finished at {finished}"
        );
    }
}
