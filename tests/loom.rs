#![allow(missing_docs)]
#![cfg(feature = "loom")]

use loom::{
    model::Builder,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};
use std::sync::Arc as StdArc;
use taskpod::{
    barrier::CountdownBarrier,
    pod::TaskPod,
    types::PodId,
};

fn pid(x: i32) -> PodId {
    PodId::new(x)
}

fn bounded() -> Builder {
    let mut builder = Builder::new();
    builder.preemption_bound = Some(3);
    builder
}

#[derive(Debug, Clone)]
struct Shared {
    // Indexed by pod id.
    outputs: Arc<Mutex<Vec<Option<u32>>>>,
    counts: Arc<Vec<AtomicUsize>>,
}

impl Shared {
    fn new(capacity: usize) -> Self {
        let outputs = vec![None; capacity];
        let counts = (0..capacity).map(|_| AtomicUsize::new(0)).collect();
        Self {
            outputs: Arc::new(Mutex::new(outputs)),
            counts: Arc::new(counts),
        }
    }

    /// Action storing `value` plus the outputs of `parents`. Panics if a
    /// parent output is not visible yet.
    fn action(&self, idx: usize, parents: &'static [usize], value: u32) -> impl FnOnce() + Send + use<> {
        let shared = self.clone();
        move || {
            shared.counts[idx].fetch_add(1, Ordering::Relaxed);
            let mut outputs = shared.outputs.lock().unwrap();
            let mut acc = value;
            for &parent in parents {
                acc += outputs[parent].expect("parent output must be visible");
            }
            outputs[idx] = Some(acc);
        }
    }

    fn output(&self, idx: usize) -> Option<u32> {
        self.outputs.lock().unwrap()[idx]
    }

    fn runs(&self, idx: usize) -> usize {
        self.counts[idx].load(Ordering::Relaxed)
    }
}

#[test]
fn loom_barrier_publishes_signalers_writes() {
    bounded().check(|| {
        let barrier = StdArc::new(CountdownBarrier::new(2));
        let data = Arc::new(AtomicUsize::new(0));

        let signalers: Vec<_> = (0..2)
            .map(|_| {
                let barrier = StdArc::clone(&barrier);
                let data = data.clone();
                thread::spawn(move || {
                    // Relaxed on purpose: visibility must come from the barrier.
                    data.fetch_add(1, Ordering::Relaxed);
                    barrier.signal();
                })
            })
            .collect();

        barrier.wait();
        assert_eq!(data.load(Ordering::Relaxed), 2);
        assert!(barrier.is_open());

        for signaler in signalers {
            signaler.join().unwrap();
        }
    });
}

#[test]
fn loom_chain_runs_in_order() {
    bounded().check(|| {
        // A(0) -> B(1)
        let shared = Shared::new(2);
        let mut a = TaskPod::new(0, [], shared.action(0, &[], 1));
        let b = TaskPod::new(1, [pid(0)], shared.action(1, &[0], 10));
        b.depends_on(&mut a);

        let b = b.run().unwrap();
        let a = a.run().unwrap();
        a.join().unwrap();
        b.join().unwrap();

        assert_eq!(shared.output(0), Some(1));
        assert_eq!(shared.output(1), Some(11));
        assert_eq!(shared.runs(0), 1);
        assert_eq!(shared.runs(1), 1);
    });
}

#[test]
fn loom_fan_in_visibility_and_single_exec() {
    bounded().check(|| {
        // A(0)   B(1)
        //    \   /
        //     C(2)
        // Values: A=1, B=10, C=100
        // Expectation: C = 1 + 10 + 100 = 111
        let shared = Shared::new(3);
        let mut a = TaskPod::new(0, [], shared.action(0, &[], 1));
        let mut b = TaskPod::new(1, [], shared.action(1, &[], 10));
        let c = TaskPod::new(2, [pid(0), pid(1)], shared.action(2, &[0, 1], 100));
        c.depends_on(&mut a);
        c.depends_on(&mut b);

        let handles = [c.run(), a.run(), b.run()].map(Result::unwrap);
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.output(0), Some(1));
        assert_eq!(shared.output(1), Some(10));
        assert_eq!(shared.output(2), Some(111));
        for idx in 0..3 {
            assert_eq!(shared.runs(idx), 1);
        }
    });
}
