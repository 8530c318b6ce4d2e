// src/tasks/analyzers.rs

//! Stages that run a single toolchain binary with a fixed argument list.

use std::path::PathBuf;

use tracing::info;

use crate::config::Properties;
use crate::config::properties::binary_path;
use crate::exec::command::{arg, flag_path};
use crate::exec::{ExecMode, checked_exec};
use crate::task::{Dependencies, ExecutionResult, Task, TaskContext, TaskName, guarded};
use crate::tasks::names;

/// A program path together with its arguments.
pub type Invocation = (PathBuf, Vec<String>);

/// A stage that runs one program built from the run properties.
pub struct ToolTask {
    name: &'static str,
    deps: Dependencies,
    mode: ExecMode,
    command: fn(&Properties) -> Invocation,
}

impl ToolTask {
    pub fn new(
        name: &'static str,
        deps: &[&str],
        mode: ExecMode,
        command: fn(&Properties) -> Invocation,
    ) -> Self {
        let deps = deps
            .iter()
            .fold(Dependencies::new(), |acc, dep| acc.depends_on(*dep));
        Self {
            name,
            deps,
            mode,
            command,
        }
    }

    /// The program and arguments this stage would run.
    pub fn invocation(&self, props: &Properties) -> Invocation {
        (self.command)(props)
    }
}

impl Task for ToolTask {
    fn name(&self) -> &str {
        self.name
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let mut result = ExecutionResult::success();
        let (program, args) = self.invocation(ctx.props);
        guarded(self.name, &mut result, |result| {
            checked_exec(ctx, self.name, &program, &args, self.mode, result)?;
            Ok(())
        });
        result
    }
}

pub fn can2lim(_props: &Properties) -> Box<dyn Task> {
    Box::new(ToolTask::new(
        names::CAN2LIM,
        &[
            names::LINK_STATIC_LIBS,
            names::STATIC_LIB_HANDLER,
            names::WRAPPER,
        ],
        ExecMode::Hard,
        can2lim_command,
    ))
}

fn can2lim_command(props: &Properties) -> Invocation {
    let mut args = vec![
        flag_path("ilist", props.wrapper_log_dir().join("component.list")),
        flag_path("out", props.lim_file()),
    ];
    if props.can2lim_max_threads > 0 {
        args.push(format!("-maxThreads:{}", props.can2lim_max_threads));
    }
    if let Some(filter) = &props.soft_filter {
        args.push(flag_path("fltp", filter));
    }
    (props.tool("CAN2Lim"), args)
}

pub fn cppcheck2graph(_props: &Properties) -> Box<dyn Task> {
    Box::new(ToolTask::new(
        names::CPPCHECK2GRAPH,
        &[
            names::LINK_STATIC_LIBS,
            names::WRAPPER,
            names::CAN2LIM,
            names::PROFILE,
        ],
        ExecMode::Soft,
        cppcheck2graph_command,
    ))
}

fn cppcheck2graph_command(props: &Properties) -> Invocation {
    let name = &props.project_name;
    let args = vec![
        flag_path("graph", props.graph_dir.join(format!("{name}-cppcheck.graph"))),
        flag_path("rul", props.temp_dir.join("Cppcheck.rul.md")),
        "-exportrul".to_string(),
        flag_path("lim", props.lim_file()),
        flag_path("inputlist", props.wrapper_log_dir().join("ast.list")),
        flag_path("out", props.timed_result_file("-Cppcheck.txt")),
    ];
    (props.tool("Cppcheck2Graph"), args)
}

pub fn lim2metrics(_props: &Properties) -> Box<dyn Task> {
    Box::new(ToolTask::new(
        names::LIM2METRICS,
        &[names::LINK_STATIC_LIBS, names::WRAPPER, names::CAN2LIM],
        ExecMode::Soft,
        lim2metrics_command,
    ))
}

fn lim2metrics_command(props: &Properties) -> Invocation {
    let args = vec![
        flag_path(
            "graph",
            props.graph_dir.join(format!("{}-metrics.graph", props.project_name)),
        ),
        flag_path("rul", props.tools_dir.join("MET.rul.md")),
        "-rulconfig:cpp".to_string(),
        "-exportrul".to_string(),
        arg(props.lim_file()),
    ];
    (props.tool("LIM2Metrics"), args)
}

pub fn dcf(_props: &Properties) -> Box<dyn Task> {
    Box::new(ToolTask::new(
        names::DCF,
        &[
            names::LINK_STATIC_LIBS,
            names::STATIC_LIB_HANDLER,
            names::WRAPPER,
            names::CAN2LIM,
        ],
        ExecMode::Soft,
        dcf_command,
    ))
}

fn dcf_command(props: &Properties) -> Invocation {
    let name = &props.project_name;
    let mut args = vec![
        flag_path("inputlist", props.wrapper_log_dir().join("component.list")),
        flag_path("lim", props.lim_file()),
        flag_path("graph", props.graph_dir.join(format!("{name}-DCF.graph"))),
        "-metrics".to_string(),
        "-multipleasgroot".to_string(),
        "-onlyfunctionclone".to_string(),
        flag_path("out", props.timed_result_file("-clones.txt")),
        flag_path("patternfilterlog", props.log_dir.join("clone-filter.log")),
        "-patternfilter".to_string(),
        "30".to_string(),
        "100".to_string(),
        flag_path("rul", props.tools_dir.join("DCF.rul.md")),
        "-rulconfig:cpp".to_string(),
        "-exportrul".to_string(),
    ];
    if let Some(lines) = props.clone_min_lines {
        args.push(format!("-minlines:{lines}"));
    }
    if props.clone_genealogy {
        args.push(flag_path(
            "genealogy",
            props.project_result_dir.join(format!("{name}.gsi")),
        ));
    }
    if let Some(filter) = &props.soft_filter {
        args.push(flag_path("fltp", filter));
    }
    (props.tool("DuplicatedCodeFinder"), args)
}

pub fn metric_hunter(_props: &Properties) -> Box<dyn Task> {
    Box::new(ToolTask::new(
        names::METRIC_HUNTER,
        &[names::GRAPH_MERGE],
        ExecMode::Soft,
        metric_hunter_command,
    ))
}

fn metric_hunter_command(props: &Properties) -> Invocation {
    let graph = props.timed_result_file(".graph");
    let args = vec![
        flag_path("graph", &graph),
        flag_path("out", props.timed_result_file("-MetricHunter.txt")),
        flag_path("thresholds", props.temp_dir.join("MetricHunter.threshold")),
        "-exportrul".to_string(),
        arg(&graph),
    ];
    (props.tool("MetricHunter"), args)
}

pub fn lim2patterns(_props: &Properties) -> Box<dyn Task> {
    Box::new(ToolTask::new(
        names::LIM2PATTERNS,
        &[
            names::GRAPH_MERGE,
            names::METRIC_HUNTER,
            names::USER_DEFINED_METRICS,
        ],
        ExecMode::Hard,
        lim2patterns_command,
    ))
}

fn lim2patterns_command(props: &Properties) -> Invocation {
    let args = vec![
        flag_path("graph", props.timed_result_file(".graph")),
        flag_path("lim", props.lim_file()),
        flag_path(
            "pattern",
            props.common_dir.join("Patterns").join("AntiPatterns"),
        ),
        flag_path("metrics", props.tools_dir.join("MET.rul.md")),
        flag_path("out", props.timed_result_file(".txt")),
    ];
    (binary_path(&props.common_dir, "LIM2Patterns"), args)
}

/// Computes user defined metrics on the merged graph.
///
/// Whether it runs is decided by the profile stage; when it does not, the
/// tool is reported as inactive and the stage succeeds.
pub struct UserDefinedMetricsTask {
    deps: Dependencies,
}

impl UserDefinedMetricsTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new()
                .depends_on(names::GRAPH_MERGE)
                .depends_on(names::METRIC_HUNTER),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }

    pub fn command(props: &Properties) -> Invocation {
        let graph = props.timed_result_file(".graph");
        let args = vec![
            arg(&graph),
            flag_path("rul", props.temp_dir.join("UDM.rul.md")),
            "-rulconfig:cpp".to_string(),
            flag_path("graph", &graph),
        ];
        (props.tool("UserDefinedMetrics"), args)
    }
}

impl Task for UserDefinedMetricsTask {
    fn name(&self) -> &str {
        names::USER_DEFINED_METRICS
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        if !ctx.state.profile.run_udm {
            info!("no user defined metrics configured; skipping");
            ctx.state.mark_inactive("UserDefinedMetrics");
            return ExecutionResult::success();
        }

        let mut result = ExecutionResult::success();
        let (program, args) = Self::command(ctx.props);
        guarded(names::USER_DEFINED_METRICS, &mut result, |result| {
            checked_exec(
                ctx,
                names::USER_DEFINED_METRICS,
                &program,
                &args,
                ExecMode::Hard,
                result,
            )?;
            Ok(())
        });
        result
    }
}
