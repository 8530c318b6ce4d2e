// src/lib.rs

pub mod archive;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod task;
pub mod tasks;
pub mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::{Overrides, Properties};
use crate::dag::DagGraph;
use crate::engine::{Controller, RunReport};
use crate::exec::ProcessRunner;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and property resolution
/// - the stage registry and the controller
/// - the production program runner
///
/// Returns the aggregated report; only setup failures are errors.
pub fn run(args: CliArgs) -> Result<RunReport> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {:?}", config_path))?;

    let overrides = Overrides {
        max_threads: args.max_threads,
        fault_tolerant: args.fault_tolerant,
        current_date: args.current_date.clone(),
        toolchain_dir: None,
    };
    let mut props = Properties::resolve(&cfg, &overrides)?;
    props.disable_missing_tools();

    let registry = tasks::registry()?;
    let runner = ProcessRunner::new();
    let mut controller = Controller::new(&props, &registry, &runner);
    tasks::populate(&mut controller)?;

    if args.dry_run {
        let plan = controller.plan()?;
        print_dry_run(&props, &plan);
        return Ok(RunReport::default());
    }

    prepare_dirs(&props)?;

    let report = controller.execute_tasks()?;
    report.log_summary();
    Ok(report)
}

/// Create the working directories every stage expects.
pub fn prepare_dirs(props: &Properties) -> Result<()> {
    for dir in [&props.log_dir, &props.temp_dir, &props.asg_dir, &props.graph_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("creating dir {:?}", dir))?;
    }
    info!(dir = %props.project_timed_result_dir.display(), "results directory prepared");
    Ok(())
}

/// Print the validated task plan without executing anything.
fn print_dry_run(props: &Properties, plan: &DagGraph) {
    println!("osa-controller dry-run");
    println!("  project = {}", props.project_name);
    println!("  results = {}", props.project_timed_result_dir.display());
    println!("  mode = {:?}", props.execution_mode);
    println!("  max_threads = {}", props.max_threads);
    println!();

    println!("tasks ({}):", plan.len());
    for name in plan.tasks() {
        println!("  - {name}");
        let deps = plan.dependencies_of(name);
        if !deps.is_empty() {
            println!("      after: {:?}", deps);
        }
    }

    debug!("dry-run complete (no execution)");
}
