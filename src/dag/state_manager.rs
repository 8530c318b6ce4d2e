// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::dag::DagGraph;
use crate::dag::task_info::{TaskInfo, TaskState};
use crate::task::{Outcome, TaskName};
use crate::types::ExecutionMode;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    mode: ExecutionMode,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        mode: ExecutionMode,
    ) -> Self {
        Self { graph, tasks, mode }
    }

    /// Whether every dependency of `info` finished without blocking it.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        ReadOnlyStateManager::new(self.tasks, self.mode).deps_satisfied_for_info(info)
    }

    /// Mark every not-yet-run transitive dependent of `failed_task` as
    /// skipped.
    ///
    /// Returns the newly skipped tasks, excluding `failed_task` itself.
    pub fn mark_dependents_skipped(&mut self, failed_task: &str, cause: Outcome) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut visited: HashSet<TaskName> = HashSet::new();
        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(info) = self.tasks.get_mut(&name) else {
                warn!(task = %name, "node in DAG not present in tasks map");
                continue;
            };
            match info.state {
                TaskState::Pending | TaskState::Ready => {
                    info.state = TaskState::Skipped {
                        blocked_by: failed_task.to_string(),
                        cause,
                    };
                    debug!(
                        task = %info.name,
                        blocked_by = %failed_task,
                        "marking dependent as skipped due to upstream failure"
                    );
                    newly_skipped.push(info.name.clone());
                    stack.extend(self.graph.dependents_of(&name).iter().cloned());
                }
                TaskState::Running | TaskState::Done(_) | TaskState::Skipped { .. } => {}
            }
        }

        newly_skipped
    }

    /// Skip every task that has not started yet, in declaration order.
    pub fn skip_all_remaining(&mut self, blocked_by: &str, cause: Outcome) -> Vec<TaskName> {
        let mut skipped: Vec<&mut TaskInfo> = self
            .tasks
            .values_mut()
            .filter(|info| matches!(info.state, TaskState::Pending | TaskState::Ready))
            .collect();
        skipped.sort_by_key(|info| info.index);

        skipped
            .into_iter()
            .map(|info| {
                info.state = TaskState::Skipped {
                    blocked_by: blocked_by.to_string(),
                    cause,
                };
                info.name.clone()
            })
            .collect()
    }

    /// Promote `Pending` tasks whose dependencies are satisfied to `Ready`.
    ///
    /// Returns them in declaration order.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<TaskName> {
        // Decide first, then mutate to avoid borrowing issues.
        let mut candidates: Vec<(usize, TaskName)> = self
            .tasks
            .values()
            .filter(|info| {
                info.state == TaskState::Pending && self.deps_satisfied_for_info(info)
            })
            .map(|info| (info.index, info.name.clone()))
            .collect();
        candidates.sort();

        let mut ready = Vec::with_capacity(candidates.len());
        for (_, name) in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                debug!(task = %info.name, "dependencies satisfied; marking Ready");
                info.state = TaskState::Ready;
                ready.push(name);
            }
        }
        ready
    }

    /// Lowest-index `Ready` task, marked `Running`.
    pub fn take_next_ready(&mut self) -> Option<TaskName> {
        let info = self
            .tasks
            .values_mut()
            .filter(|info| info.state == TaskState::Ready)
            .min_by_key(|info| info.index)?;
        info.state = TaskState::Running;
        Some(info.name.clone())
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.values().all(|info| info.state.is_terminal())
    }
}

/// A read-only view for checking dependency satisfaction.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
    mode: ExecutionMode,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>, mode: ExecutionMode) -> Self {
        Self { tasks, mode }
    }

    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep_name| match self.tasks.get(dep_name) {
            Some(dep) => match &dep.state {
                TaskState::Done(outcome) => !self.mode.blocks(*outcome),
                TaskState::Pending
                | TaskState::Ready
                | TaskState::Running
                | TaskState::Skipped { .. } => false,
            },
            None => {
                warn!(
                    task = %info.name,
                    dep = %dep_name,
                    "dependency missing from tasks map"
                );
                false
            }
        })
    }
}
