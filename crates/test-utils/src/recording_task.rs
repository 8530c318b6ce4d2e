use std::sync::{Arc, Mutex};

use osa_controller::config::Properties;
use osa_controller::task::{
    Dependencies, ExecutionResult, Outcome, Task, TaskContext, TaskName, TaskRegistry,
};

/// Names of executed tasks, shared between tasks of one run.
pub type ExecLog = Arc<Mutex<Vec<String>>>;

pub fn exec_log() -> ExecLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A task that records its execution and finishes with a scripted outcome.
pub struct RecordingTask {
    name: String,
    deps: Dependencies,
    outcome: Outcome,
    log: ExecLog,
}

impl RecordingTask {
    pub fn new(name: &str, deps: &[&str], log: &ExecLog) -> Self {
        let deps = deps
            .iter()
            .fold(Dependencies::new(), |acc, d| acc.depends_on(*d));
        Self {
            name: name.to_string(),
            deps,
            outcome: Outcome::Success,
            log: Arc::clone(log),
        }
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn boxed(self) -> Box<dyn Task> {
        Box::new(self)
    }
}

impl Task for RecordingTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, _ctx: &mut TaskContext<'_>) -> ExecutionResult {
        self.log.lock().unwrap().push(self.name.clone());
        match self.outcome {
            Outcome::Success => ExecutionResult::success(),
            outcome => {
                ExecutionResult::with(outcome, format!("{} finished with {outcome}", self.name))
            }
        }
    }
}

fn placeholder(_props: &Properties) -> Box<dyn Task> {
    RecordingTask::new("placeholder", &[], &exec_log()).boxed()
}

/// A registry that knows `names`; the factories are placeholders, tests add
/// their own task instances.
pub fn registry_of(names: &[&'static str]) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    for name in names {
        registry.register(*name, placeholder).expect("unique test task names");
    }
    registry
}
