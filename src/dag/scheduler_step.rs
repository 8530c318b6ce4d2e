// src/dag/scheduler_step.rs

//! Step-by-step result type for the scheduler.

use crate::task::TaskName;

/// Structured result of recording one task completion.
///
/// Useful for tests that want to step the DAG by hand and assert on what
/// changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks whose dependencies all finished with this step.
    pub newly_ready: Vec<TaskName>,
    /// Tasks that will never run because of this step.
    pub newly_skipped: Vec<TaskName>,
    /// Whether every task is now in a terminal state.
    pub run_just_finished: bool,
}
