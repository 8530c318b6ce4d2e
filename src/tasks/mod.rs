// src/tasks/mod.rs

//! The C/C++ analysis pipeline.
//!
//! Every stage is a [`Task`](crate::task::Task) registered under a stable
//! name. [`registry`] builds the table of all stages and [`populate`] adds the
//! stages enabled for a run to a controller, recording the disabled analyzers
//! as inactive.

pub mod analyzers;
pub mod clang_tidy;
pub mod cleanup;
pub mod components;
pub mod graph;
pub mod profile;
pub mod wrapper;

use tracing::debug;

use crate::engine::Controller;
use crate::errors::Result;
use crate::task::TaskRegistry;

/// Stable task names.
pub mod names {
    pub const CLEANUP: &str = "CleanupTask";
    pub const WRAPPER: &str = "WrapperTask";
    pub const LINK_STATIC_LIBS: &str = "LinkStaticLibsTask";
    pub const STATIC_LIB_HANDLER: &str = "StaticLibHandlerTask";
    pub const CAN2LIM: &str = "Can2limTask";
    pub const PROFILE: &str = "ProfileTask";
    pub const USER_DEFINED_METRICS: &str = "UserDefinedMetricsTask";
    pub const CPPCHECK2GRAPH: &str = "Cppcheck2GraphTask";
    pub const LIM2METRICS: &str = "Lim2metricsTask";
    pub const DCF: &str = "DcfTask";
    pub const CLANG_TIDY: &str = "ClangTidyTask";
    pub const GRAPH_MERGE: &str = "GraphMergeTask";
    pub const METRIC_HUNTER: &str = "MetricHunterTask";
    pub const GRAPH_DUMP: &str = "GraphDumpTask";
    pub const LIM2PATTERNS: &str = "LIM2PatternsTask";
    pub const CLEAN_RESULTS: &str = "CleanResultsTask";
    pub const CLEAN_PROJECT: &str = "CleanProjectTask";
}

/// Every stage of the pipeline.
pub fn registry() -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    registry.register(names::CLEANUP, cleanup::CleanupTask::boxed)?;
    registry.register(names::WRAPPER, wrapper::WrapperTask::boxed)?;
    registry.register(names::LINK_STATIC_LIBS, components::LinkStaticLibsTask::boxed)?;
    registry.register(names::STATIC_LIB_HANDLER, components::StaticLibHandlerTask::boxed)?;
    registry.register(names::CAN2LIM, analyzers::can2lim)?;
    registry.register(names::PROFILE, profile::ProfileTask::boxed)?;
    registry.register(names::USER_DEFINED_METRICS, analyzers::UserDefinedMetricsTask::boxed)?;
    registry.register(names::CPPCHECK2GRAPH, analyzers::cppcheck2graph)?;
    registry.register(names::LIM2METRICS, analyzers::lim2metrics)?;
    registry.register(names::DCF, analyzers::dcf)?;
    registry.register(names::CLANG_TIDY, clang_tidy::ClangTidyTask::boxed)?;
    registry.register(names::GRAPH_MERGE, graph::GraphMergeTask::boxed)?;
    registry.register(names::METRIC_HUNTER, analyzers::metric_hunter)?;
    registry.register(names::GRAPH_DUMP, graph::GraphDumpTask::boxed)?;
    registry.register(names::LIM2PATTERNS, analyzers::lim2patterns)?;
    registry.register(names::CLEAN_RESULTS, cleanup::CleanResultsTask::boxed)?;
    registry.register(names::CLEAN_PROJECT, cleanup::CleanProjectTask::boxed)?;
    Ok(registry)
}

/// Add the stages enabled by the run properties, in pipeline order.
pub fn populate(controller: &mut Controller<'_>) -> Result<()> {
    let props = controller.props();

    controller.add_registered(names::CLEANUP)?;
    controller.add_registered(names::WRAPPER)?;
    if props.expand_static_libs {
        controller.add_registered(names::STATIC_LIB_HANDLER)?;
    } else {
        controller.add_registered(names::LINK_STATIC_LIBS)?;
    }
    controller.add_registered(names::CAN2LIM)?;
    controller.add_registered(names::PROFILE)?;

    // Without an explicit setting the profile decides at run time.
    let udm = props.run_udm != Some(false);
    optional(controller, udm, names::USER_DEFINED_METRICS, "UserDefinedMetrics")?;
    optional(controller, props.run_cppcheck, names::CPPCHECK2GRAPH, "Cppcheck2Graph")?;
    optional(controller, props.run_lim_metrics, names::LIM2METRICS, "LIM2Metrics")?;
    optional(controller, props.run_dcf, names::DCF, "DuplicatedCodeFinder")?;
    optional(controller, props.run_clang_tidy, names::CLANG_TIDY, "ClangTidy")?;

    controller.add_registered(names::GRAPH_MERGE)?;
    optional(controller, props.run_metric_hunter, names::METRIC_HUNTER, "MetricHunter")?;
    controller.add_registered(names::GRAPH_DUMP)?;
    optional(controller, props.run_lim2patterns, names::LIM2PATTERNS, "LIM2Patterns")?;

    if props.clean_results != -1 {
        controller.add_registered(names::CLEAN_RESULTS)?;
    }
    if props.clean_project {
        controller.add_registered(names::CLEAN_PROJECT)?;
    }
    Ok(())
}

fn optional(controller: &mut Controller<'_>, enabled: bool, task: &str, tool: &str) -> Result<()> {
    if enabled {
        controller.add_registered(task)
    } else {
        debug!(task = %task, "analyzer disabled for this run");
        controller.mark_inactive(tool);
        Ok(())
    }
}
