// src/dag/task_info.rs

//! Task metadata and per-run state.

use crate::task::{Outcome, TaskName};

/// Per-run state of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting on at least one dependency.
    Pending,
    /// Every dependency finished without blocking; may be picked next.
    Ready,
    /// Handed to the controller and currently executing.
    Running,
    /// Executed; the outcome decides whether dependents may run.
    Done(Outcome),
    /// Never executed because `blocked_by` failed (directly or upstream).
    Skipped {
        blocked_by: TaskName,
        /// Outcome of `blocked_by` that caused the skip.
        cause: Outcome,
    },
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done(_) | TaskState::Skipped { .. })
    }
}

/// Static task information plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Declaration index.
    pub index: usize,
    /// Direct dependencies that are part of this run.
    pub deps: Vec<TaskName>,
    pub state: TaskState,
}

impl TaskInfo {
    pub fn new(name: TaskName, index: usize, deps: Vec<TaskName>) -> Self {
        let state = if deps.is_empty() {
            TaskState::Ready
        } else {
            TaskState::Pending
        };
        Self {
            name,
            index,
            deps,
            state,
        }
    }
}
