// src/exec/command.rs

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::task::{ExecutionResult, TaskContext};

/// How a non-zero exit status is treated by [`checked_exec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// The program's output is required: a non-zero exit is an `Err`.
    Hard,
    /// Best-effort tool: a non-zero exit escalates the result to `Error`
    /// and the task continues.
    Soft,
}

/// Run `program` for `task`, appending its output to `<log_dir>/<task>.log`.
///
/// Returns `Ok(true)` when the program exited with status 0.
pub fn checked_exec(
    ctx: &TaskContext<'_>,
    task: &str,
    program: &Path,
    args: &[String],
    mode: ExecMode,
    result: &mut ExecutionResult,
) -> Result<bool> {
    checked_exec_env(ctx, task, program, args, &[], mode, result)
}

/// [`checked_exec`] with extra environment variables for the child.
pub fn checked_exec_env(
    ctx: &TaskContext<'_>,
    task: &str,
    program: &Path,
    args: &[String],
    env: &[(String, String)],
    mode: ExecMode,
    result: &mut ExecutionResult,
) -> Result<bool> {
    let log_path = ctx.props.task_log_path(task);
    let mut log = open_log(&log_path)?;

    debug!(task = %task, program = %program.display(), "checked exec");
    let code = ctx
        .runner
        .run_with_env(program, args, env, &mut log)
        .with_context(|| format!("running {}", program.display()))?;

    if code == 0 {
        return Ok(true);
    }

    let message = format!(
        "{} exited with code {code}. Check log: {}",
        program.display(),
        log_path.display()
    );
    match mode {
        ExecMode::Hard => bail!(message),
        ExecMode::Soft => {
            warn!(task = %task, exit_code = code, "{message}");
            result.set_error(message);
            Ok(false)
        }
    }
}

/// Open a log file for appending, creating its directory if needed.
pub fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log {:?}", path))
}

/// Render a path as a command-line argument.
pub fn arg(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().into_owned()
}

/// `-<flag>:<path>` style argument used by most of the toolchain.
pub fn flag_path(flag: &str, path: impl Into<PathBuf>) -> String {
    format!("-{flag}:{}", path.into().display())
}
