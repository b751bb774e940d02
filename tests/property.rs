#![allow(missing_docs)]
#![cfg(not(feature = "loom"))]

mod common;

use common::{Journal, init_tracing, pid};
use proptest::prelude::*;
use std::collections::BTreeSet;
use taskpod::pod::TaskPod;

/// Random DAGs: pod `i` may only wait for pods `0..i`, so the graph is
/// acyclic. Returns dependency lists plus a shuffled start order.
fn dag_strategy(max_pods: usize) -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
    (1..=max_pods).prop_flat_map(|pods| {
        let deps = proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), pods)
            .prop_map(|raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        if i == 0 {
                            return Vec::new();
                        }
                        let unique: BTreeSet<_> = picks.into_iter().map(|p| p % i).collect();
                        unique.into_iter().collect()
                    })
                    .collect::<Vec<_>>()
            });
        let start_order = Just((0..pods).collect::<Vec<_>>()).prop_shuffle();
        (deps, start_order)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn actions_run_once_after_all_dependencies((deps, start_order) in dag_strategy(8)) {
        init_tracing();
        let journal = Journal::new(deps.len());
        let mut pods: Vec<Option<TaskPod>> = deps
            .iter()
            .enumerate()
            .map(|(i, wait_for)| {
                Some(TaskPod::new(
                    i as i32,
                    wait_for.iter().map(|&d| pid(d as i32)),
                    journal.action(i, 0),
                ))
            })
            .collect();

        // Dependencies always have a lower index than their dependents.
        for (child, wait_for) in deps.iter().enumerate() {
            let (before, rest) = pods.split_at_mut(child);
            let child_pod = rest[0].as_ref().unwrap();
            for &dependency in wait_for {
                child_pod.depends_on(before[dependency].as_mut().unwrap());
            }
        }

        let handles: Vec<_> = start_order
            .iter()
            .map(|&i| pods[i].take().unwrap().run().unwrap())
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for (child, wait_for) in deps.iter().enumerate() {
            prop_assert_eq!(journal.entry(child).runs, 1);
            for &dependency in wait_for {
                journal.assert_after(dependency, child);
            }
        }
    }
}
