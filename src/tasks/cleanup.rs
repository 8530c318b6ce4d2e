// src/tasks/cleanup.rs

//! Housekeeping stages: old results, analysis output in the project tree and
//! the temporary wrapper binaries.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Properties;
use crate::task::{Dependencies, ExecutionResult, Task, TaskContext, TaskName, guarded};
use crate::tasks::names;

/// Keeps only the newest `clean_results` timestamped result directories.
#[derive(Debug)]
pub struct CleanResultsTask {
    deps: Dependencies,
}

impl CleanResultsTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new(),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

impl Task for CleanResultsTask {
    fn name(&self) -> &str {
        names::CLEAN_RESULTS
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let props = ctx.props;
        let mut result = ExecutionResult::success();
        guarded(names::CLEAN_RESULTS, &mut result, |result| {
            let keep = usize::try_from(props.clean_results).unwrap_or(0);
            let dated =
                dated_result_dirs(&props.project_result_dir, &props.project_timed_result_dir)?;

            let remove = dated.len().saturating_sub(keep);
            for dir in dated.iter().take(remove) {
                info!(dir = %dir.display(), "removing old result directory");
                if let Err(err) = fs::remove_dir_all(dir) {
                    result.set_warning(format!("Failed to remove {}: {err}", dir.display()));
                }
            }

            if props.clean_results == 0 {
                for suffix in [".gsi", ".graph"] {
                    let file = props
                        .project_result_dir
                        .join(format!("{}{suffix}", props.project_name));
                    info!(file = %file.display(), "removing file");
                    if let Err(err) = fs::remove_file(&file) {
                        result.set_warning(format!("Failed to remove {}: {err}", file.display()));
                    }
                }
            }
            Ok(())
        });
        result
    }
}

/// Timestamped result directories other than `current`, oldest first.
pub fn dated_result_dirs(project_result_dir: &Path, current: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Regex::new(r"^\d{4}(-\d{2}){5}$")?;
    let mut dirs = Vec::new();
    if !project_result_dir.is_dir() {
        return Ok(dirs);
    }
    let entries = fs::read_dir(project_result_dir)
        .with_context(|| format!("reading dir {:?}", project_result_dir))?;
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| pattern.is_match(n));
        if path.is_dir() && matches && path != current {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Removes every `analysis_output_dir` directory below the project base dir.
#[derive(Debug)]
pub struct CleanProjectTask {
    deps: Dependencies,
}

impl CleanProjectTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new()
                .depends_on(names::CAN2LIM)
                .depends_on(names::GRAPH_DUMP),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

impl Task for CleanProjectTask {
    fn name(&self) -> &str {
        names::CLEAN_PROJECT
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let props = ctx.props;
        let mut result = ExecutionResult::success();
        let Some(base_dir) = props.project_base_dir.as_deref().filter(|d| d.is_dir()) else {
            return result;
        };

        let output_name = props.analysis_output_dir.as_str();
        let mut found = Vec::new();
        let mut walker = WalkDir::new(base_dir).into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() && entry.file_name() == output_name {
                found.push(entry.into_path());
                walker.skip_current_dir();
            }
        }

        for dir in found {
            info!(dir = %dir.display(), "removing analysis output directory");
            if let Err(err) = fs::remove_dir_all(&dir) {
                result.set_warning(format!("Failed to remove {}: {err}", dir.display()));
            }
        }
        result
    }
}

/// Releases extracted archives and removes the wrapper bin directory.
#[derive(Debug)]
pub struct CleanupTask {
    deps: Dependencies,
}

const REMOVE_ATTEMPTS: usize = 3;

impl CleanupTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new().depends_on(names::GRAPH_MERGE),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

impl Task for CleanupTask {
    fn name(&self) -> &str {
        names::CLEANUP
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let mut result = ExecutionResult::success();

        info!(archives = ctx.arena.len(), "removing temporarily extracted archives");
        ctx.arena.clear();

        let bin_dir = ctx.props.wrapper_tmp_dir.join("bin");
        if !bin_dir.exists() {
            return result;
        }

        let mut last_err = None;
        for _ in 0..REMOVE_ATTEMPTS {
            match fs::remove_dir_all(&bin_dir) {
                Ok(()) => {
                    last_err = None;
                    break;
                }
                Err(err) => last_err = Some(err),
            }
        }
        if let Some(err) = last_err {
            result.set_warning(format!("Failed to remove wrapper bin directory. {err}"));
        }
        result
    }
}
