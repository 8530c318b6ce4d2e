// src/tasks/graph.rs

//! Merging the per-analyzer graphs and exporting the result.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::Glob;

use crate::config::Properties;
use crate::exec::command::arg;
use crate::exec::{ExecMode, checked_exec};
use crate::task::{Dependencies, ExecutionResult, Task, TaskContext, TaskName, guarded};
use crate::tasks::names;

/// Every `*.graph` file directly inside `dir`, sorted.
pub fn graph_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let matcher = Glob::new("*.graph")?.compile_matcher();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading dir {:?}", dir))? {
        let path = entry?.path();
        let matches = path.file_name().is_some_and(|name| matcher.is_match(name));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug)]
pub struct GraphMergeTask {
    deps: Dependencies,
}

impl GraphMergeTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new()
                .depends_on(names::LINK_STATIC_LIBS)
                .depends_on(names::WRAPPER)
                .depends_on(names::CPPCHECK2GRAPH)
                .depends_on(names::LIM2METRICS)
                .depends_on(names::DCF)
                .depends_on(names::CLANG_TIDY),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

impl Task for GraphMergeTask {
    fn name(&self) -> &str {
        names::GRAPH_MERGE
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let props = ctx.props;
        let mut result = ExecutionResult::success();
        guarded(names::GRAPH_MERGE, &mut result, |result| {
            let mut args: Vec<String> = graph_files(&props.graph_dir)?
                .iter()
                .map(|p| arg(p))
                .collect();
            args.push(format!("-out:{}", props.timed_result_file(".graph").display()));
            args.push("-summary".to_string());
            checked_exec(
                ctx,
                names::GRAPH_MERGE,
                &props.tool("GraphMerge"),
                &args,
                ExecMode::Hard,
                result,
            )?;
            Ok(())
        });
        result
    }
}

/// Exports the merged graph and its summary.
#[derive(Debug)]
pub struct GraphDumpTask {
    deps: Dependencies,
}

impl GraphDumpTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new()
                .depends_on(names::GRAPH_MERGE)
                .depends_on(names::METRIC_HUNTER)
                .depends_on(names::USER_DEFINED_METRICS)
                .depends_on(names::LIM2PATTERNS),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }

    pub fn commands(props: &Properties) -> [Vec<String>; 2] {
        [
            vec![
                arg(props.timed_result_file(".graph")),
                "-csv".to_string(),
                "-xml".to_string(),
                format!("-csvseparator:{}", props.csv_separator),
                format!("-csvdecimalmark:{}", props.csv_decimal_mark),
                "-sarif".to_string(),
                format!("-sarifseverity:{}", props.sarif_severity),
            ],
            vec![
                arg(props.timed_result_file("-summary.graph")),
                "-xml".to_string(),
                "-json".to_string(),
            ],
        ]
    }
}

impl Task for GraphDumpTask {
    fn name(&self) -> &str {
        names::GRAPH_DUMP
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let props = ctx.props;
        let mut result = ExecutionResult::success();
        guarded(names::GRAPH_DUMP, &mut result, |result| {
            let program = props.tool("GraphDump");
            for args in Self::commands(props) {
                checked_exec(ctx, names::GRAPH_DUMP, &program, &args, ExecMode::Hard, result)?;
            }
            Ok(())
        });
        result
    }
}
