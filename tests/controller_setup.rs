// tests/controller_setup.rs

mod common;
use crate::common::{PropertiesBuilder, RecordingTask, executed, exec_log, registry_of, run_tasks};

use osa_controller::errors::ControllerError;

const NAMES: [&str; 4] = ["A", "B", "C", "Disabled"];

#[test]
fn cycle_is_rejected_before_anything_runs() {
    let project = PropertiesBuilder::new().build();
    let log = exec_log();
    let tasks = vec![
        RecordingTask::new("Z", &[], &log).boxed(),
        RecordingTask::new("A", &["B"], &log).boxed(),
        RecordingTask::new("B", &["A"], &log).boxed(),
    ];
    let registry = registry_of(&["A", "B", "Z"]);

    match run_tasks(&project.props, &registry, tasks) {
        Err(ControllerError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        other => panic!("expected DagCycle, got {other:?}"),
    }
    assert!(executed(&log).is_empty());
}

#[test]
fn self_dependency_is_a_cycle() {
    let project = PropertiesBuilder::new().build();
    let log = exec_log();
    let tasks = vec![RecordingTask::new("A", &["A"], &log).boxed()];

    match run_tasks(&project.props, &registry_of(&NAMES), tasks) {
        Err(ControllerError::DagCycle(msg)) => assert!(msg.contains("depends on itself")),
        other => panic!("expected DagCycle, got {other:?}"),
    }
    assert!(executed(&log).is_empty());
}

#[test]
fn unknown_dependency_is_rejected() {
    let project = PropertiesBuilder::new().build();
    let log = exec_log();
    let tasks = vec![
        RecordingTask::new("A", &[], &log).boxed(),
        RecordingTask::new("B", &["NoSuchTask"], &log).boxed(),
    ];

    match run_tasks(&project.props, &registry_of(&NAMES), tasks) {
        Err(ControllerError::TaskNotFound(msg)) => {
            assert!(msg.contains("NoSuchTask"));
            assert!(msg.contains('B'));
        }
        other => panic!("expected TaskNotFound, got {other:?}"),
    }
    assert!(executed(&log).is_empty());
}

#[test]
fn duplicate_task_is_rejected() {
    let project = PropertiesBuilder::new().build();
    let log = exec_log();
    let tasks = vec![
        RecordingTask::new("A", &[], &log).boxed(),
        RecordingTask::new("A", &[], &log).boxed(),
    ];

    match run_tasks(&project.props, &registry_of(&NAMES), tasks) {
        Err(ControllerError::DuplicateTask(name)) => assert_eq!(name, "A"),
        other => panic!("expected DuplicateTask, got {other:?}"),
    }
    assert!(executed(&log).is_empty());
}

#[test]
fn dependency_on_known_but_absent_task_is_dropped() {
    let project = PropertiesBuilder::new().build();
    let log = exec_log();
    let tasks = vec![
        RecordingTask::new("A", &[], &log).boxed(),
        RecordingTask::new("B", &["A", "Disabled"], &log).boxed(),
    ];

    let report = run_tasks(&project.props, &registry_of(&NAMES), tasks).unwrap();

    assert_eq!(executed(&log), vec!["A", "B"]);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn registry_rejects_duplicate_names() {
    let mut registry = registry_of(&["A"]);
    let err = registry
        .register("A", |_| RecordingTask::new("A", &[], &exec_log()).boxed())
        .unwrap_err();
    assert!(matches!(err, ControllerError::DuplicateTask(name) if name == "A"));
    assert_eq!(registry.len(), 1);
}
