// src/task/registry.rs

use crate::config::Properties;
use crate::errors::{ControllerError, Result};
use crate::task::Task;

/// Constructor for one task kind.
pub type TaskFactory = fn(&Properties) -> Box<dyn Task>;

/// Table of every task kind the controller can build, in registration order.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    entries: Vec<(&'static str, TaskFactory)>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task kind. Names must be unique.
    pub fn register(&mut self, name: &'static str, factory: TaskFactory) -> Result<()> {
        if self.known(name) {
            return Err(ControllerError::DuplicateTask(name.to_string()));
        }
        self.entries.push((name, factory));
        Ok(())
    }

    /// Whether `name` is a real task kind, enabled for this run or not.
    pub fn known(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    /// Construct the task registered under `name`.
    pub fn create(&self, name: &str, props: &Properties) -> Result<Box<dyn Task>> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, factory)| factory(props))
            .ok_or_else(|| ControllerError::TaskNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
