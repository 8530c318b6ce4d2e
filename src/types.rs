// src/types.rs

use std::fmt;

use serde::Deserialize;

use crate::task::Outcome;

/// How the controller reacts to a task that finished with `Error`.
///
/// - `FailOnCriticalErrorOnly`: fault tolerant mode. An `Error` is recorded
///   in the aggregate status but dependents still run; only `CriticalError`
///   blocks them.
/// - `FailOnAnyError`: an `Error` blocks every (transitive) dependent just
///   like a `CriticalError` does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    FailOnCriticalErrorOnly,
    FailOnAnyError,
}

impl ExecutionMode {
    pub fn from_fault_tolerant(fault_tolerant: bool) -> Self {
        if fault_tolerant {
            ExecutionMode::FailOnCriticalErrorOnly
        } else {
            ExecutionMode::FailOnAnyError
        }
    }

    /// Whether a dependency that finished with `outcome` blocks its dependents.
    pub fn blocks(self, outcome: Outcome) -> bool {
        match self {
            ExecutionMode::FailOnCriticalErrorOnly => outcome == Outcome::CriticalError,
            ExecutionMode::FailOnAnyError => outcome >= Outcome::Error,
        }
    }
}

/// Which compiler family the wrapper intercepts during the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapperMode {
    /// `clang`/`clang++`/`llvm-ar`/`ld.lld`.
    Clang,
    /// MSVC `cl.exe`/`link.exe`/`lib.exe`.
    Cl,
}

impl Default for WrapperMode {
    fn default() -> Self {
        if cfg!(windows) {
            WrapperMode::Cl
        } else {
            WrapperMode::Clang
        }
    }
}

impl fmt::Display for WrapperMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WrapperMode::Clang => "clang",
            WrapperMode::Cl => "cl",
        };
        f.write_str(s)
    }
}
