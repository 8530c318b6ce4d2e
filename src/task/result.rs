// src/task/result.rs

//! Per-task outcome values.

use std::fmt;

/// Severity of a task outcome, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Success,
    /// Recoverable anomaly; the pipeline proceeds.
    Warning,
    /// The task's primary objective failed.
    Error,
    /// Output required by the rest of the pipeline is missing or corrupt.
    CriticalError,
}

impl Outcome {
    /// The most severe outcome in `outcomes`, or `Success` for none.
    pub fn worst<I>(outcomes: I) -> Outcome
    where
        I: IntoIterator<Item = Outcome>,
    {
        outcomes.into_iter().max().unwrap_or(Outcome::Success)
    }

    /// Process exit code for a run whose aggregate status is `self`.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Warning => 1,
            Outcome::Error => 2,
            Outcome::CriticalError => 3,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Warning => "warning",
            Outcome::Error => "error",
            Outcome::CriticalError => "critical error",
        };
        f.write_str(s)
    }
}

/// Result of one `Task::execute` call.
///
/// The outcome only ever escalates: once a result is `CriticalError` no
/// later call can bring it back down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    outcome: Outcome,
    messages: Vec<String>,
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self::success()
    }
}

impl ExecutionResult {
    pub fn success() -> Self {
        Self {
            outcome: Outcome::Success,
            messages: Vec::new(),
        }
    }

    /// A fresh result already at `outcome`.
    pub fn with(outcome: Outcome, message: impl Into<String>) -> Self {
        let mut result = Self::success();
        result.escalate(outcome, message);
        result
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// All recorded messages, one per line, or `None` if nothing was recorded.
    pub fn message(&self) -> Option<String> {
        if self.messages.is_empty() {
            None
        } else {
            Some(self.messages.join("\n"))
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Raise the outcome to at least `outcome` and record `message`.
    ///
    /// Empty messages are not recorded.
    pub fn escalate(&mut self, outcome: Outcome, message: impl Into<String>) {
        self.outcome = self.outcome.max(outcome);
        let message = message.into();
        if !message.is_empty() {
            self.messages.push(message);
        }
    }

    pub fn set_warning(&mut self, message: impl Into<String>) {
        self.escalate(Outcome::Warning, message);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.escalate(Outcome::Error, message);
    }

    pub fn set_critical_error(&mut self, message: impl Into<String>) {
        self.escalate(Outcome::CriticalError, message);
    }

    /// Record a warning unless `ok` holds.
    pub fn warning_if_fail(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.set_warning(message);
        }
    }

    /// Record an error unless `ok` holds.
    pub fn error_if_fail(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.set_error(message);
        }
    }
}
