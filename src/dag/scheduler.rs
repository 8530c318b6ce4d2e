// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{TaskInfo, TaskState};
use crate::task::{Outcome, TaskName};
use crate::types::ExecutionMode;

/// How failures affect the rest of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailurePolicy {
    pub mode: ExecutionMode,
    /// Skip every task that has not started once any task reports
    /// `CriticalError`, not only its dependents.
    pub abort_on_critical: bool,
}

/// Scheduler holds the immutable DAG plus the per-run state of every task.
///
/// It is responsible for:
/// - handing out the next task to execute (lowest declaration index first)
/// - recording outcomes
/// - promoting dependents whose dependencies are all done
/// - skipping dependents that are blocked by a failure
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    policy: FailurePolicy,
}

impl Scheduler {
    pub fn new(graph: DagGraph, policy: FailurePolicy) -> Self {
        let tasks = graph
            .tasks()
            .enumerate()
            .map(|(index, name)| {
                let deps = graph.dependencies_of(name).to_vec();
                (name.to_string(), TaskInfo::new(name.to_string(), index, deps))
            })
            .collect();

        Self {
            graph,
            tasks,
            policy,
        }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Task names in declaration order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    pub fn state_of(&self, task: &str) -> Option<&TaskState> {
        self.tasks.get(task).map(|info| &info.state)
    }

    /// Whether the dependencies of `task` are satisfied.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks, self.policy.mode);
        Some(mgr.deps_satisfied_for_info(info))
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.values().all(|info| info.state.is_terminal())
    }

    /// Pick the next task to execute and mark it `Running`.
    ///
    /// Returns `None` once nothing is ready.
    pub fn next_task(&mut self) -> Option<TaskName> {
        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.policy.mode);
        let next = manager.take_next_ready();
        if let Some(name) = &next {
            debug!(task = %name, "scheduling task");
        }
        next
    }

    /// Record the outcome of a task handed out by [`Scheduler::next_task`].
    pub fn step_completion(&mut self, task: &str, outcome: Outcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        match self.tasks.get_mut(task) {
            Some(info) if info.state == TaskState::Running => {
                info.state = TaskState::Done(outcome);
            }
            Some(info) => {
                warn!(
                    task = %task,
                    state = ?info.state,
                    "completion for task that is not running; ignoring"
                );
                return step;
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                return step;
            }
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.policy.mode);

        if outcome == Outcome::CriticalError && self.policy.abort_on_critical {
            warn!(task = %task, "critical error; skipping every remaining task");
            step.newly_skipped = manager.skip_all_remaining(task, outcome);
        } else if self.policy.mode.blocks(outcome) {
            warn!(task = %task, %outcome, "task failed; skipping dependents");
            step.newly_skipped = manager.mark_dependents_skipped(task, outcome);
        }

        step.newly_ready = manager.collect_new_ready_tasks();
        step.run_just_finished = manager.all_tasks_terminal();

        if step.run_just_finished {
            info!("scheduler: all tasks terminal");
        }
        step
    }
}
