// tests/property_scheduler.rs

mod common;
use crate::common::{PropertiesBuilder, RecordingTask, exec_log, executed, registry_of, run_tasks};

use osa_controller::engine::RunReport;
use osa_controller::task::Outcome;
use proptest::prelude::*;
use proptest::sample::subsequence;

const NAMES: [&str; 10] = ["T0", "T1", "T2", "T3", "T4", "T5", "T6", "T7", "T8", "T9"];

/// Random DAG over `T0..Tn`: task `i` depends only on lower indices. The
/// second vector flags the tasks that fail.
fn dag_with_failures() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<bool>)> {
    (1usize..=NAMES.len()).prop_flat_map(|n| {
        let deps: Vec<_> = (0..n)
            .map(|i| subsequence((0..i).collect::<Vec<_>>(), 0..=i.min(3)))
            .collect();
        (deps, proptest::collection::vec(proptest::bool::weighted(0.2), n))
    })
}

fn run(deps: &[Vec<usize>], failing: &[bool], outcome: Outcome) -> (Vec<String>, RunReport) {
    let project = PropertiesBuilder::new().build();
    let log = exec_log();
    // Declared in reverse so declaration order never matches dependency order.
    let tasks = (0..deps.len())
        .rev()
        .map(|i| {
            let dep_names: Vec<&str> = deps[i].iter().map(|&d| NAMES[d]).collect();
            let task = RecordingTask::new(NAMES[i], &dep_names, &log);
            if failing[i] {
                task.with_outcome(outcome).boxed()
            } else {
                task.boxed()
            }
        })
        .collect();
    let report = run_tasks(&project.props, &registry_of(&NAMES), tasks).unwrap();
    (executed(&log), report)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn critical_failures_skip_exactly_their_descendants((deps, failing) in dag_with_failures()) {
        let (order, report) = run(&deps, &failing, Outcome::CriticalError);

        let mut blocked = vec![false; deps.len()];
        for i in 0..deps.len() {
            blocked[i] = deps[i].iter().any(|&d| blocked[d] || failing[d]);
        }

        // Every task ends executed or skipped, exactly once.
        prop_assert_eq!(report.records.len(), deps.len());
        for i in 0..deps.len() {
            let ran = order.iter().any(|n| n == NAMES[i]);
            prop_assert_eq!(ran, !blocked[i], "task {}", NAMES[i]);
        }

        // Executed tasks come after all their dependencies.
        for (pos, name) in order.iter().enumerate() {
            let i = NAMES.iter().position(|n| n == name).unwrap();
            for &d in &deps[i] {
                let dep_pos = order.iter().position(|n| n == NAMES[d]);
                prop_assert!(dep_pos.is_some_and(|p| p < pos));
            }
        }

        let expected = if failing.iter().zip(&blocked).any(|(f, b)| *f && !*b) {
            3
        } else {
            0
        };
        prop_assert_eq!(report.exit_code(), expected);
    }

    #[test]
    fn plain_errors_block_nothing_when_fault_tolerant((deps, failing) in dag_with_failures()) {
        let (order, report) = run(&deps, &failing, Outcome::Error);

        prop_assert_eq!(order.len(), deps.len());
        prop_assert_eq!(report.skipped().count(), 0);
        let expected = if failing.contains(&true) { 2 } else { 0 };
        prop_assert_eq!(report.exit_code(), expected);
    }
}
