// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::WrapperMode;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [project]
/// name = "zlib"
/// results_dir = "results"
/// build_script = "build.sh"
///
/// [run]
/// max_threads = 8
/// fault_tolerant = true
/// clang_tidy = true
///
/// [clang_tidy]
/// disabled_checks = ["modernize-use-trailing-return-type"]
/// ```
///
/// Only `[project]` is required; every other section has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub project: ProjectSection,

    #[serde(default)]
    pub toolchain: ToolchainSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub wrapper: WrapperSection,

    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub clone: CloneSection,

    #[serde(default)]
    pub clang_tidy: ClangTidySection,

    #[serde(default)]
    pub archive: ArchiveSection,
}

/// Validated configuration.
///
/// Can only be obtained through `ConfigFile::try_from(RawConfigFile)`, so the
/// rest of the crate may assume the invariants checked in `config::validate`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub toolchain: ToolchainSection,
    pub run: RunSection,
    pub wrapper: WrapperSection,
    pub output: OutputSection,
    pub clone: CloneSection,
    pub clang_tidy: ClangTidySection,
    pub archive: ArchiveSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            project: raw.project,
            toolchain: raw.toolchain,
            run: raw.run,
            wrapper: raw.wrapper,
            output: raw.output,
            clone: raw.clone,
            clang_tidy: raw.clang_tidy,
            archive: raw.archive,
        }
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Name of the analyzed system; used in every result file name.
    pub name: String,

    /// Directory under which `<name>/cpp/<date>/` is created.
    pub results_dir: PathBuf,

    /// Script that builds the project while the wrapper is on the PATH.
    pub build_script: PathBuf,

    /// Name of the timestamped result directory. Defaults to the current
    /// local time as `%Y-%m-%d-%H-%M-%S`.
    #[serde(default)]
    pub current_date: Option<String>,

    /// Root of the analyzed sources; required by `run.clean_project`.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolchainSection {
    /// Installation directory of the analyzer tools. Falls back to
    /// `OSA_TOOLCHAIN_DIR`, then to the directory of the running executable.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// `[run]` section: parallelism, failure policy and optional analyzers.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Thread budget for fan-out tasks; `0` means number of CPU cores.
    #[serde(default)]
    pub max_threads: usize,

    /// Passed to CAN2Lim as `-maxThreads`; `0` lets the tool decide.
    #[serde(default)]
    pub can2lim_max_threads: usize,

    /// Fault tolerant mode: only critical errors block dependent tasks.
    #[serde(default = "default_true")]
    pub fault_tolerant: bool,

    /// Stop scheduling everything after the first critical error.
    #[serde(default)]
    pub abort_on_critical: bool,

    /// Keep only the newest N timestamped result directories; `-1` disables.
    #[serde(default = "default_clean_results")]
    pub clean_results: i32,

    /// Remove analysis output directories from `project.base_dir`.
    #[serde(default)]
    pub clean_project: bool,

    /// Inline the contents of static libraries into every component that
    /// links them, instead of listing each library as its own component.
    #[serde(default)]
    pub expand_static_libs: bool,

    #[serde(default = "default_true")]
    pub cppcheck: bool,

    #[serde(default = "default_true")]
    pub clang_tidy: bool,

    #[serde(default = "default_true")]
    pub metric_hunter: bool,

    #[serde(default = "default_true")]
    pub dcf: bool,

    #[serde(default = "default_true")]
    pub lim_metrics: bool,

    /// User defined metrics. `None` lets the profile decide.
    #[serde(default)]
    pub udm: Option<bool>,

    #[serde(default = "default_true")]
    pub lim2patterns: bool,
}

fn default_true() -> bool {
    true
}

fn default_clean_results() -> i32 {
    -1
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            max_threads: 0,
            can2lim_max_threads: 0,
            fault_tolerant: true,
            abort_on_critical: false,
            clean_results: default_clean_results(),
            clean_project: false,
            expand_static_libs: false,
            cppcheck: true,
            clang_tidy: true,
            metric_hunter: true,
            dcf: true,
            lim_metrics: true,
            udm: None,
            lim2patterns: true,
        }
    }
}

/// `[wrapper]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WrapperSection {
    #[serde(default)]
    pub mode: WrapperMode,

    /// Prefix for wrapped compiler names (e.g. `arm-none-eabi-`).
    #[serde(default)]
    pub prefix: String,

    /// Postfix for wrapped compiler names (e.g. `-12`).
    #[serde(default)]
    pub postfix: String,

    /// Filter file deciding which build commands are wrapped at all.
    #[serde(default)]
    pub hard_filter: Option<PathBuf>,

    /// Filter file deciding which source elements appear in the results.
    #[serde(default)]
    pub soft_filter: Option<PathBuf>,

    #[serde(default)]
    pub no_delayed_template_parsing: bool,
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_csv_separator")]
    pub csv_separator: String,

    #[serde(default = "default_csv_decimal_mark")]
    pub csv_decimal_mark: String,

    #[serde(default = "default_sarif_severity")]
    pub sarif_severity: String,

    /// Directory name the wrapper writes next to the analyzed sources.
    #[serde(default = "default_analysis_output_dir")]
    pub analysis_output_dir: String,
}

fn default_csv_separator() -> String {
    ",".to_string()
}

fn default_csv_decimal_mark() -> String {
    ".".to_string()
}

fn default_sarif_severity() -> String {
    "2".to_string()
}

fn default_analysis_output_dir() -> String {
    ".osa".to_string()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            csv_separator: default_csv_separator(),
            csv_decimal_mark: default_csv_decimal_mark(),
            sarif_severity: default_sarif_severity(),
            analysis_output_dir: default_analysis_output_dir(),
        }
    }
}

/// `[clone]` section (DuplicatedCodeFinder).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CloneSection {
    #[serde(default)]
    pub min_lines: Option<u32>,

    #[serde(default)]
    pub genealogy: bool,
}

/// `[clang_tidy]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClangTidySection {
    /// Checks written as `-<check>` after the `*` wildcard in `ClangTidy.conf`.
    #[serde(default)]
    pub disabled_checks: Vec<String>,
}

/// `[archive]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveSection {
    /// External command used to unpack static library archives. `{archive}`
    /// and `{dir}` are replaced by the archive path and target directory.
    #[serde(default = "default_extract_cmd")]
    pub extract_cmd: Vec<String>,
}

fn default_extract_cmd() -> Vec<String> {
    ["unzip", "-o", "-q", "{archive}", "-d", "{dir}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            extract_cmd: default_extract_cmd(),
        }
    }
}
