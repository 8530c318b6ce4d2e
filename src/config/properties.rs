// src/config/properties.rs

//! The read-only run configuration shared by every task.
//!
//! All working directories are resolved exactly once, here, so tasks never
//! recompute paths:
//!
//! ```text
//! <results_dir>/<project>/cpp/                      project_result_dir
//! <results_dir>/<project>/cpp/<date>/               project_timed_result_dir
//!     openstaticanalyzer/log                        log_dir
//!     openstaticanalyzer/temp                       temp_dir
//!     openstaticanalyzer/temp/wrapper               wrapper_tmp_dir
//!     openstaticanalyzer/asg                        asg_dir
//!     openstaticanalyzer/graph                      graph_dir
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::model::ConfigFile;
use crate::types::{ExecutionMode, WrapperMode};

const WORK_DIR_NAME: &str = "openstaticanalyzer";

/// Values that take precedence over the config file (CLI flags, tests).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_threads: Option<usize>,
    pub fault_tolerant: Option<bool>,
    pub current_date: Option<String>,
    pub toolchain_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Properties {
    pub project_name: String,
    pub build_script: PathBuf,
    pub results_dir: PathBuf,
    pub current_date: String,
    pub project_base_dir: Option<PathBuf>,

    pub project_result_dir: PathBuf,
    pub project_timed_result_dir: PathBuf,
    pub log_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub asg_dir: PathBuf,
    pub graph_dir: PathBuf,
    pub wrapper_tmp_dir: PathBuf,
    /// `wrapper_tmp_dir` relative to the timed result directory.
    pub wrapper_tmp_dir_name: PathBuf,

    pub toolchain_dir: PathBuf,
    pub tools_dir: PathBuf,
    pub common_dir: PathBuf,
    pub wrapper_dir: PathBuf,
    pub wrapper_bin_dir: PathBuf,
    pub wrapper_tools_dir: PathBuf,

    pub max_threads: usize,
    pub can2lim_max_threads: usize,
    pub execution_mode: ExecutionMode,
    pub abort_on_critical: bool,
    pub clean_results: i32,
    pub clean_project: bool,
    pub expand_static_libs: bool,

    pub run_cppcheck: bool,
    pub run_clang_tidy: bool,
    pub run_metric_hunter: bool,
    pub run_dcf: bool,
    pub run_lim_metrics: bool,
    pub run_udm: Option<bool>,
    pub run_lim2patterns: bool,

    pub wrapper_mode: WrapperMode,
    pub prefix: String,
    pub postfix: String,
    pub hard_filter: Option<PathBuf>,
    pub soft_filter: Option<PathBuf>,
    pub no_delayed_template_parsing: bool,

    pub csv_separator: char,
    pub csv_decimal_mark: char,
    pub sarif_severity: String,
    pub analysis_output_dir: String,

    pub clone_min_lines: Option<u32>,
    pub clone_genealogy: bool,

    pub clang_tidy_disabled_checks: Vec<String>,
    pub extract_cmd: Vec<String>,
}

impl Properties {
    /// Resolve a validated config into the run configuration.
    pub fn resolve(cfg: &ConfigFile, overrides: &Overrides) -> Result<Self> {
        let results_dir = std::path::absolute(&cfg.project.results_dir)
            .with_context(|| format!("resolving results dir {:?}", cfg.project.results_dir))?;
        let build_script = std::path::absolute(&cfg.project.build_script)
            .with_context(|| format!("resolving build script {:?}", cfg.project.build_script))?;
        let project_base_dir = cfg
            .project
            .base_dir
            .as_ref()
            .map(std::path::absolute)
            .transpose()
            .context("resolving project base dir")?;

        let current_date = overrides
            .current_date
            .clone()
            .or_else(|| cfg.project.current_date.clone())
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d-%H-%M-%S").to_string());

        let project_result_dir = results_dir.join(&cfg.project.name).join("cpp");
        let project_timed_result_dir = project_result_dir.join(&current_date);
        let work_dir = project_timed_result_dir.join(WORK_DIR_NAME);
        let temp_dir = work_dir.join("temp");

        let toolchain_dir = match &overrides.toolchain_dir {
            Some(dir) => dir.clone(),
            None => resolve_toolchain_dir(cfg.toolchain.dir.as_deref())?,
        };
        let platform = platform_name();
        let wrapper_dir = toolchain_dir.join(format!("{platform}Wrapper"));
        let wrapper_bin_dir = wrapper_dir.join("WrapperBins");

        let max_threads = match overrides.max_threads.unwrap_or(cfg.run.max_threads) {
            0 => num_cpus::get().max(1),
            n => n,
        };
        let fault_tolerant = overrides.fault_tolerant.unwrap_or(cfg.run.fault_tolerant);

        let csv_separator = if cfg.output.csv_separator == "\\t" {
            '\t'
        } else {
            first_char(&cfg.output.csv_separator, ',')
        };

        let props = Self {
            project_name: cfg.project.name.clone(),
            build_script,
            results_dir,
            current_date,
            project_base_dir,

            project_result_dir,
            project_timed_result_dir,
            log_dir: work_dir.join("log"),
            asg_dir: work_dir.join("asg"),
            graph_dir: work_dir.join("graph"),
            wrapper_tmp_dir: temp_dir.join("wrapper"),
            wrapper_tmp_dir_name: Path::new(WORK_DIR_NAME).join("temp").join("wrapper"),
            temp_dir,

            tools_dir: toolchain_dir.join(format!("{platform}Tools")),
            common_dir: toolchain_dir.join("Common"),
            wrapper_tools_dir: wrapper_bin_dir.join("Tools"),
            wrapper_bin_dir,
            wrapper_dir,
            toolchain_dir,

            max_threads,
            can2lim_max_threads: cfg.run.can2lim_max_threads,
            execution_mode: ExecutionMode::from_fault_tolerant(fault_tolerant),
            abort_on_critical: cfg.run.abort_on_critical,
            clean_results: cfg.run.clean_results,
            clean_project: cfg.run.clean_project,
            expand_static_libs: cfg.run.expand_static_libs,

            run_cppcheck: cfg.run.cppcheck,
            run_clang_tidy: cfg.run.clang_tidy,
            run_metric_hunter: cfg.run.metric_hunter,
            run_dcf: cfg.run.dcf,
            run_lim_metrics: cfg.run.lim_metrics,
            run_udm: cfg.run.udm,
            run_lim2patterns: cfg.run.lim2patterns,

            wrapper_mode: cfg.wrapper.mode,
            prefix: cfg.wrapper.prefix.clone(),
            postfix: cfg.wrapper.postfix.clone(),
            hard_filter: absolute_opt(cfg.wrapper.hard_filter.as_deref())?,
            soft_filter: absolute_opt(cfg.wrapper.soft_filter.as_deref())?,
            no_delayed_template_parsing: cfg.wrapper.no_delayed_template_parsing,

            csv_separator,
            csv_decimal_mark: first_char(&cfg.output.csv_decimal_mark, '.'),
            sarif_severity: cfg.output.sarif_severity.clone(),
            analysis_output_dir: cfg.output.analysis_output_dir.clone(),

            clone_min_lines: cfg.clone.min_lines,
            clone_genealogy: cfg.clone.genealogy,

            clang_tidy_disabled_checks: cfg.clang_tidy.disabled_checks.clone(),
            extract_cmd: cfg.archive.extract_cmd.clone(),
        };

        debug!(?props, "resolved run properties");
        Ok(props)
    }

    /// Path of a tool binary inside the tools directory.
    pub fn tool(&self, name: &str) -> PathBuf {
        binary_path(&self.tools_dir, name)
    }

    /// Switch off optional analyzers whose driver binary is not installed.
    pub fn disable_missing_tools(&mut self) {
        let tools = self.tools_dir.clone();
        self.run_cppcheck = self.run_cppcheck && tool_installed(&tools, "Cppcheck2Graph");
        self.run_lim_metrics = self.run_lim_metrics && tool_installed(&tools, "LIM2Metrics");
        self.run_dcf = self.run_dcf && tool_installed(&tools, "DuplicatedCodeFinder");
        self.run_metric_hunter = self.run_metric_hunter && tool_installed(&tools, "MetricHunter");
        self.run_lim2patterns =
            self.run_lim2patterns && tool_installed(&self.common_dir, "LIM2Patterns");
        self.run_clang_tidy = self.run_clang_tidy
            && tool_installed(&tools, "ClangTidy2Graph")
            && tool_installed(&self.wrapper_tools_dir, "clang-tidy");
    }

    /// Per-task log file: `<log_dir>/<task>.log`.
    pub fn task_log_path(&self, task: &str) -> PathBuf {
        self.log_dir.join(format!("{task}.log"))
    }

    /// `<project_timed_result_dir>/<project><suffix>`
    pub fn timed_result_file(&self, suffix: &str) -> PathBuf {
        self.project_timed_result_dir
            .join(format!("{}{}", self.project_name, suffix))
    }

    /// `<asg_dir>/<project>.lim`
    pub fn lim_file(&self) -> PathBuf {
        self.asg_dir.join(format!("{}.lim", self.project_name))
    }

    /// `<wrapper_tmp_dir>/log`, where the wrapper writes its file lists.
    pub fn wrapper_log_dir(&self) -> PathBuf {
        self.wrapper_tmp_dir.join("log")
    }
}

/// Append the platform executable suffix to a tool name.
pub fn binary_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
}

fn tool_installed(dir: &Path, name: &str) -> bool {
    let installed = binary_path(dir, name).exists();
    if !installed {
        info!(tool = name, "tool binary not found in toolchain; disabling");
    }
    installed
}

fn platform_name() -> &'static str {
    if cfg!(windows) {
        "Windows"
    } else if cfg!(target_os = "macos") {
        "Darwin"
    } else {
        "Linux"
    }
}

fn resolve_toolchain_dir(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        return std::path::absolute(dir)
            .with_context(|| format!("resolving toolchain dir {:?}", dir));
    }
    if let Ok(dir) = std::env::var("OSA_TOOLCHAIN_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let exe = std::env::current_exe().context("locating the running executable")?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn absolute_opt(path: Option<&Path>) -> Result<Option<PathBuf>> {
    path.map(|p| std::path::absolute(p).with_context(|| format!("resolving {:?}", p)))
        .transpose()
}

fn first_char(s: &str, fallback: char) -> char {
    s.chars().next().unwrap_or(fallback)
}
