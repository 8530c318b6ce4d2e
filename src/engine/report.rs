// src/engine/report.rs

//! Aggregated outcome of one pipeline run.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::task::{Outcome, TaskName};

/// What happened to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Executed {
        outcome: Outcome,
        message: Option<String>,
        elapsed: Duration,
    },
    Skipped {
        blocked_by: TaskName,
        /// Outcome of the blocking task.
        cause: Outcome,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub name: TaskName,
    pub status: TaskStatus,
}

impl TaskRecord {
    pub fn executed(&self) -> bool {
        matches!(self.status, TaskStatus::Executed { .. })
    }

    /// Severity this record contributes to the aggregate status.
    fn severity(&self) -> Outcome {
        match &self.status {
            TaskStatus::Executed { outcome, .. } => *outcome,
            TaskStatus::Skipped { cause, .. } => *cause,
        }
    }
}

/// Per-task records, in the order tasks finished or were skipped, plus the
/// inactive tool list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub records: Vec<TaskRecord>,
    pub inactive: Vec<TaskName>,
}

impl RunReport {
    /// Worst outcome observed.
    ///
    /// A task skipped because of a critical dependency makes the run
    /// `CriticalError`; one skipped because of an `Error` makes it at least
    /// `Error`.
    pub fn status(&self) -> Outcome {
        Outcome::worst(self.records.iter().map(TaskRecord::severity))
    }

    pub fn exit_code(&self) -> i32 {
        self.status().exit_code()
    }

    pub fn record(&self, task: &str) -> Option<&TaskRecord> {
        self.records.iter().find(|r| r.name == task)
    }

    /// Names of executed tasks, in execution order.
    pub fn executed(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(|r| r.executed())
            .map(|r| r.name.as_str())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(|r| !r.executed())
            .map(|r| r.name.as_str())
    }

    /// Emit one summary line per task and one for the run.
    pub fn log_summary(&self) {
        for record in &self.records {
            match &record.status {
                TaskStatus::Executed {
                    outcome, elapsed, ..
                } => {
                    let elapsed_ms = elapsed.as_millis() as u64;
                    info!(task = %record.name, %outcome, elapsed_ms, "summary")
                }
                TaskStatus::Skipped { blocked_by, cause } => {
                    warn!(task = %record.name, blocked_by = %blocked_by, %cause, "summary: skipped")
                }
            }
        }
        if !self.inactive.is_empty() {
            info!(inactive = ?self.inactive, "tools not run");
        }

        let status = self.status();
        if status >= Outcome::Error {
            error!(%status, exit_code = status.exit_code(), "pipeline finished");
        } else {
            info!(%status, exit_code = status.exit_code(), "pipeline finished");
        }
    }
}
