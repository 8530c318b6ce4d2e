// src/task/mod.rs

//! The unit-of-work contract shared by the controller and every pipeline stage.
//!
//! - [`result`] holds the outcome value returned by every task.
//! - [`registry`] maps task names to constructors.

pub mod registry;
pub mod result;

use std::path::PathBuf;

use tracing::error;

use crate::archive::ArchiveArena;
use crate::config::Properties;
use crate::exec::ProgramRunner;

pub use registry::{TaskFactory, TaskRegistry};
pub use result::{ExecutionResult, Outcome};

/// Canonical task name type used throughout the controller.
pub type TaskName = String;

/// One unit of pipeline work with declared prerequisites.
///
/// A task is constructed once per run, executed at most once and then
/// dropped. Failures inside `execute` are reported through the returned
/// [`ExecutionResult`], never by panicking.
pub trait Task: Send {
    /// Stable, unique name. Used as graph key and log label.
    fn name(&self) -> &str;

    /// Names of the tasks that must finish before this one starts.
    fn dependencies(&self) -> &[TaskName];

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult;
}

/// Ordered, duplicate-free list of predecessor names.
///
/// Built in a task constructor and frozen afterwards:
///
/// ```
/// use osa_controller::task::Dependencies;
///
/// let deps = Dependencies::new()
///     .depends_on("WrapperTask")
///     .depends_on("WrapperTask");
/// assert_eq!(deps.as_slice(), ["WrapperTask".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    names: Vec<TaskName>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depends_on(mut self, name: impl Into<TaskName>) -> Self {
        let name = name.into();
        if !self.names.contains(&name) {
            self.names.push(name);
        }
        self
    }

    pub fn as_slice(&self) -> &[TaskName] {
        &self.names
    }
}

/// Values produced by earlier tasks for later ones within one run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Tools that are not part of this run, reported in the final summary.
    pub inactive: Vec<TaskName>,
    pub profile: ProfileOverrides,
}

impl RunState {
    pub fn mark_inactive(&mut self, name: impl Into<TaskName>) {
        let name = name.into();
        if !self.inactive.contains(&name) {
            self.inactive.push(name);
        }
    }
}

/// Settings decided by the profile stage.
#[derive(Debug, Clone, Default)]
pub struct ProfileOverrides {
    /// Whether user defined metrics are computed in this run.
    pub run_udm: bool,
    /// Generated clang-tidy configuration, once written.
    pub clang_tidy_config: Option<PathBuf>,
    /// Rule files copied into the temp directory.
    pub rule_files: Vec<PathBuf>,
}

/// Everything a task may touch while executing.
pub struct TaskContext<'a> {
    pub props: &'a Properties,
    pub runner: &'a dyn ProgramRunner,
    pub arena: &'a mut ArchiveArena,
    pub state: &'a mut RunState,
}

/// Run a task body and turn any escaping error into a `CriticalError`.
///
/// The body receives the task's result so that soft failures can escalate it
/// without leaving the body.
pub fn guarded<F>(task: &str, result: &mut ExecutionResult, body: F)
where
    F: FnOnce(&mut ExecutionResult) -> anyhow::Result<()>,
{
    if let Err(err) = body(result) {
        error!(task = %task, error = %format!("{err:#}"), "task body failed");
        result.set_critical_error(format!("{err:#}"));
    }
}
