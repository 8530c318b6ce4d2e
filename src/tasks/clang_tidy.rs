// src/tasks/clang_tidy.rs

//! clang-tidy over every translation unit the wrapper saw, then conversion of
//! the findings into a graph.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::Properties;
use crate::config::properties::binary_path;
use crate::exec::command::flag_path;
use crate::exec::{ExecMode, WorkerPool, checked_exec};
use crate::fs::{load_string_list, sorted_unique};
use crate::task::{Dependencies, ExecutionResult, Task, TaskContext, TaskName, guarded};
use crate::tasks::names;
use crate::tasks::profile::CLANG_TIDY_CONFIG;

#[derive(Debug)]
pub struct ClangTidyTask {
    deps: Dependencies,
}

impl ClangTidyTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new()
                .depends_on(names::CAN2LIM)
                .depends_on(names::PROFILE),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

/// Arguments for one clang-tidy run on `file`.
pub fn clang_tidy_args(file: &str, config: &Path) -> Vec<String> {
    vec![
        file.to_string(),
        format!("-config-file={}", config.display()),
        format!("-xml={file}.ct.err"),
        "--".to_string(),
    ]
}

fn remove_stale_output(file: &str) -> io::Result<()> {
    match fs::remove_file(format!("{file}.ct.err")) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl Task for ClangTidyTask {
    fn name(&self) -> &str {
        names::CLANG_TIDY
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let props = ctx.props;
        let mut result = ExecutionResult::success();
        guarded(names::CLANG_TIDY, &mut result, |result| {
            let ast_list = props.wrapper_log_dir().join("ast.list");
            let Some(files) = load_string_list(&ast_list)? else {
                info!(list = %ast_list.display(), "no translation units recorded");
                return Ok(());
            };
            let files = sorted_unique(files);

            let config = ctx
                .state
                .profile
                .clang_tidy_config
                .clone()
                .unwrap_or_else(|| props.temp_dir.join(CLANG_TIDY_CONFIG));

            let mut items = Vec::with_capacity(files.len());
            for file in &files {
                remove_stale_output(file)
                    .with_context(|| format!("removing stale output of {file}"))?;
                items.push(clang_tidy_args(file, &config));
            }

            let clang_tidy = binary_path(&props.wrapper_tools_dir, "clang-tidy");
            let runner = ctx.runner;
            let pool = WorkerPool::new(names::CLANG_TIDY, &props.log_dir, props.max_threads);
            let report = pool.drain(items, |args, log| {
                match runner.run(&clang_tidy, args, log) {
                    Ok(code) => code == 0,
                    Err(err) => {
                        warn!(error = %format!("{err:#}"), "failed to start clang-tidy");
                        false
                    }
                }
            })?;
            info!(
                processed = report.processed,
                threads = report.spawned + 1,
                "clang-tidy finished"
            );
            result.error_if_fail(!report.failed(), report.failure_message());

            let name = &props.project_name;
            let args = vec![
                flag_path("graph", props.graph_dir.join(format!("{name}-clangtidy.graph"))),
                flag_path("rul", props.temp_dir.join("ClangTidy.rul.md")),
                "-exportrul".to_string(),
                flag_path("lim", props.lim_file()),
                flag_path("inputlist", &ast_list),
                flag_path("out", props.timed_result_file("-ClangTidy.txt")),
            ];
            checked_exec(
                ctx,
                names::CLANG_TIDY,
                &props.tool("ClangTidy2Graph"),
                &args,
                ExecMode::Soft,
                result,
            )?;
            Ok(())
        });
        result
    }
}
