// tests/controller_execution.rs

mod common;
use crate::common::{
    PropertiesBuilder, RecordingTask, executed, exec_log, init_tracing, registry_of, run_tasks,
};

use osa_controller::engine::TaskStatus;
use osa_controller::task::Outcome;

const NAMES: [&str; 5] = ["A", "B", "C", "D", "E"];

#[test]
fn tasks_run_in_dependency_order_with_declaration_tie_break() {
    init_tracing();
    let project = PropertiesBuilder::new().build();
    let log = exec_log();

    // Declared out of dependency order on purpose.
    let tasks = vec![
        RecordingTask::new("C", &["A", "B"], &log).boxed(),
        RecordingTask::new("B", &["A"], &log).boxed(),
        RecordingTask::new("A", &[], &log).boxed(),
        RecordingTask::new("D", &[], &log).boxed(),
    ];

    let report = run_tasks(&project.props, &registry_of(&NAMES), tasks).unwrap();

    // A and D start ready; afterwards B and C outrank D by declaration index.
    assert_eq!(executed(&log), vec!["A", "B", "C", "D"]);
    assert_eq!(report.status(), Outcome::Success);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.skipped().count(), 0);
}

#[test]
fn critical_error_skips_transitive_dependents_only() {
    init_tracing();
    let project = PropertiesBuilder::new().build();
    let log = exec_log();

    let tasks = vec![
        RecordingTask::new("A", &[], &log)
            .with_outcome(Outcome::CriticalError)
            .boxed(),
        RecordingTask::new("B", &["A"], &log).boxed(),
        RecordingTask::new("C", &["B"], &log).boxed(),
        RecordingTask::new("D", &[], &log).boxed(),
    ];

    let report = run_tasks(&project.props, &registry_of(&NAMES), tasks).unwrap();

    assert_eq!(executed(&log), vec!["A", "D"]);
    let skipped: Vec<&str> = report.skipped().collect();
    assert_eq!(skipped.len(), 2);
    assert!(skipped.contains(&"B"));
    assert!(skipped.contains(&"C"));

    match &report.record("C").unwrap().status {
        TaskStatus::Skipped { blocked_by, cause } => {
            assert_eq!(blocked_by, "A");
            assert_eq!(*cause, Outcome::CriticalError);
        }
        other => panic!("expected C to be skipped, got {other:?}"),
    }
    assert_eq!(report.status(), Outcome::CriticalError);
    assert_eq!(report.exit_code(), 3);
}

#[test]
fn error_does_not_block_dependents_in_fault_tolerant_mode() {
    init_tracing();
    let project = PropertiesBuilder::new().build();
    let log = exec_log();

    let tasks = vec![
        RecordingTask::new("A", &[], &log)
            .with_outcome(Outcome::Error)
            .boxed(),
        RecordingTask::new("B", &["A"], &log).boxed(),
    ];

    let report = run_tasks(&project.props, &registry_of(&NAMES), tasks).unwrap();

    assert_eq!(executed(&log), vec!["A", "B"]);
    assert_eq!(report.status(), Outcome::Error);
    assert_eq!(report.exit_code(), 2);
}

#[test]
fn error_blocks_dependents_when_not_fault_tolerant() {
    init_tracing();
    let project = PropertiesBuilder::new()
        .run_option("fault_tolerant", "false")
        .build();
    let log = exec_log();

    let tasks = vec![
        RecordingTask::new("A", &[], &log)
            .with_outcome(Outcome::Error)
            .boxed(),
        RecordingTask::new("B", &["A"], &log).boxed(),
        RecordingTask::new("C", &[], &log)
            .with_outcome(Outcome::Warning)
            .boxed(),
        RecordingTask::new("D", &["C"], &log).boxed(),
    ];

    let report = run_tasks(&project.props, &registry_of(&NAMES), tasks).unwrap();

    // A warning never blocks.
    assert_eq!(executed(&log), vec!["A", "C", "D"]);
    assert_eq!(report.skipped().collect::<Vec<_>>(), vec!["B"]);
    assert_eq!(report.status(), Outcome::Error);
}

#[test]
fn abort_on_critical_skips_everything_not_yet_run() {
    init_tracing();
    let project = PropertiesBuilder::new()
        .run_option("abort_on_critical", "true")
        .build();
    let log = exec_log();

    let tasks = vec![
        RecordingTask::new("A", &[], &log).boxed(),
        RecordingTask::new("B", &[], &log)
            .with_outcome(Outcome::CriticalError)
            .boxed(),
        RecordingTask::new("C", &[], &log).boxed(),
        RecordingTask::new("D", &["A"], &log).boxed(),
    ];

    let report = run_tasks(&project.props, &registry_of(&NAMES), tasks).unwrap();

    assert_eq!(executed(&log), vec!["A", "B"]);
    assert_eq!(report.skipped().collect::<Vec<_>>(), vec!["C", "D"]);
    assert_eq!(report.exit_code(), 3);
}

#[test]
fn warnings_aggregate_to_exit_code_one() {
    init_tracing();
    let project = PropertiesBuilder::new().build();
    let log = exec_log();

    let tasks = vec![
        RecordingTask::new("A", &[], &log).boxed(),
        RecordingTask::new("B", &["A"], &log)
            .with_outcome(Outcome::Warning)
            .boxed(),
    ];

    let report = run_tasks(&project.props, &registry_of(&NAMES), tasks).unwrap();

    assert_eq!(report.status(), Outcome::Warning);
    assert_eq!(report.exit_code(), 1);
    match &report.record("B").unwrap().status {
        TaskStatus::Executed {
            outcome, message, ..
        } => {
            assert_eq!(*outcome, Outcome::Warning);
            assert_eq!(message.as_deref(), Some("B finished with warning"));
        }
        other => panic!("expected B to be executed, got {other:?}"),
    }
}

#[test]
fn empty_run_succeeds() {
    let project = PropertiesBuilder::new().build();
    let report = run_tasks(&project.props, &registry_of(&NAMES), Vec::new()).unwrap();
    assert!(report.records.is_empty());
    assert_eq!(report.exit_code(), 0);
}
