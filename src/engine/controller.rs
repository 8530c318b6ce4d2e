// src/engine/controller.rs

//! Sequential driver of one pipeline run.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::archive::ArchiveArena;
use crate::config::Properties;
use crate::dag::{DagGraph, FailurePolicy, Scheduler, TaskState};
use crate::engine::report::{RunReport, TaskRecord, TaskStatus};
use crate::errors::Result;
use crate::exec::ProgramRunner;
use crate::task::{ExecutionResult, Outcome, RunState, Task, TaskContext, TaskName, TaskRegistry};

/// Owns every task of one run together with the state they share.
///
/// Tasks execute one at a time, in dependency order; among tasks that are
/// ready at the same moment the one added first runs first.
pub struct Controller<'a> {
    props: &'a Properties,
    registry: &'a TaskRegistry,
    runner: &'a dyn ProgramRunner,
    tasks: Vec<Box<dyn Task>>,
    arena: ArchiveArena,
    state: RunState,
}

impl<'a> Controller<'a> {
    pub fn new(
        props: &'a Properties,
        registry: &'a TaskRegistry,
        runner: &'a dyn ProgramRunner,
    ) -> Self {
        Self {
            props,
            registry,
            runner,
            tasks: Vec::new(),
            arena: ArchiveArena::new(),
            state: RunState::default(),
        }
    }

    pub fn props(&self) -> &'a Properties {
        self.props
    }

    pub fn add_task(&mut self, task: Box<dyn Task>) {
        self.tasks.push(task);
    }

    /// Construct the task registered under `name` and add it.
    pub fn add_registered(&mut self, name: &str) -> Result<()> {
        let task = self.registry.create(name, self.props)?;
        self.tasks.push(task);
        Ok(())
    }

    /// Record a tool that is not part of this run.
    pub fn mark_inactive(&mut self, name: impl Into<TaskName>) {
        self.state.mark_inactive(name);
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name())
    }

    pub fn policy(&self) -> FailurePolicy {
        FailurePolicy {
            mode: self.props.execution_mode,
            abort_on_critical: self.props.abort_on_critical,
        }
    }

    /// Validate the declared dependencies without running anything.
    pub fn plan(&self) -> Result<DagGraph> {
        DagGraph::build(
            self.tasks.iter().map(|t| (t.name(), t.dependencies())),
            |name| self.registry.known(name),
        )
    }

    /// Run every task in dependency order and aggregate the outcomes.
    ///
    /// Fails only on setup errors (unknown dependency, duplicate, cycle), in
    /// which case no task has been executed.
    pub fn execute_tasks(mut self) -> Result<RunReport> {
        let graph = self.plan()?;
        let mut scheduler = Scheduler::new(graph, self.policy());

        let positions: HashMap<TaskName, usize> = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();

        info!(
            tasks = self.tasks.len(),
            mode = ?self.props.execution_mode,
            "executing pipeline"
        );

        let mut report = RunReport::default();

        while let Some(name) = scheduler.next_task() {
            let Some(&position) = positions.get(&name) else {
                warn!(task = %name, "scheduled task has no instance; ignoring");
                continue;
            };

            info!(task = %name, "task started");
            let started = Instant::now();

            let task = &mut self.tasks[position];
            let mut ctx = TaskContext {
                props: self.props,
                runner: self.runner,
                arena: &mut self.arena,
                state: &mut self.state,
            };
            let result = task.execute(&mut ctx);
            let elapsed = started.elapsed();

            log_task_end(&name, &result, elapsed.as_millis() as u64);

            let outcome = result.outcome();
            report.records.push(TaskRecord {
                name: name.clone(),
                status: TaskStatus::Executed {
                    outcome,
                    message: result.message(),
                    elapsed,
                },
            });

            let step = scheduler.step_completion(&name, outcome);
            for skipped in step.newly_skipped {
                let state = scheduler.state_of(&skipped);
                if let Some(TaskState::Skipped { blocked_by, cause }) = state {
                    warn!(task = %skipped, blocked_by = %blocked_by, %cause, "task skipped");
                    report.records.push(TaskRecord {
                        name: skipped.clone(),
                        status: TaskStatus::Skipped {
                            blocked_by: blocked_by.clone(),
                            cause: *cause,
                        },
                    });
                }
            }
        }

        report.inactive = self.state.inactive.clone();
        Ok(report)
    }
}

fn log_task_end(name: &str, result: &ExecutionResult, elapsed_ms: u64) {
    let outcome = result.outcome();
    let message = result.message().unwrap_or_default();
    match outcome {
        Outcome::Success => info!(task = %name, elapsed_ms, "task finished"),
        Outcome::Warning => {
            warn!(task = %name, %outcome, elapsed_ms, message = %message, "task finished")
        }
        Outcome::Error | Outcome::CriticalError => {
            error!(task = %name, %outcome, elapsed_ms, message = %message, "task finished")
        }
    }
}
