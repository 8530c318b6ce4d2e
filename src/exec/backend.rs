// src/exec/backend.rs

//! Pluggable program runner abstraction.
//!
//! Tasks never spawn processes directly; they go through a `ProgramRunner`
//! taken from their [`TaskContext`](crate::task::TaskContext). Production code
//! uses [`ProcessRunner`]; tests provide a fake that records invocations and
//! returns scripted exit codes.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Runs one external program synchronously and reports its exit code.
///
/// Implementations append everything the program prints to `log`. A program
/// that cannot be started is an `Err`; a program that ran and exited with a
/// non-zero status is `Ok(code)`.
pub trait ProgramRunner: Send + Sync {
    fn run_with_env(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
        log: &mut dyn Write,
    ) -> Result<i32>;

    fn run(&self, program: &Path, args: &[String], log: &mut dyn Write) -> Result<i32> {
        self.run_with_env(program, args, &[], log)
    }
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProgramRunner for ProcessRunner {
    fn run_with_env(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
        log: &mut dyn Write,
    ) -> Result<i32> {
        debug!(program = %program.display(), ?args, "starting process");

        let output = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawning {}", program.display()))?;

        log.write_all(&output.stdout)
            .and_then(|_| log.write_all(&output.stderr))
            .and_then(|_| log.flush())
            .with_context(|| format!("writing output of {}", program.display()))?;

        let code = output.status.code().unwrap_or(-1);
        info!(
            program = %program.display(),
            exit_code = code,
            success = output.status.success(),
            "process exited"
        );
        Ok(code)
    }
}
