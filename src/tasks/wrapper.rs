// src/tasks/wrapper.rs

//! Runs the project's build with the compiler toolchain wrapped.
//!
//! The wrapped tools record every compiled translation unit and linked
//! component in list files under `temp/wrapper/log`, which drive the rest of
//! the pipeline.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::Properties;
use crate::config::properties::binary_path;
use crate::exec::command::arg;
use crate::exec::{ExecMode, checked_exec_env};
use crate::task::{Dependencies, ExecutionResult, Task, TaskContext, TaskName, guarded};
use crate::tasks::names;
use crate::types::WrapperMode;

/// Environment variable naming the wrapper environment configuration file.
pub const CONFIG_FILE_ENV: &str = "ANALYZER_WRAPPER_CONFIG_FILE";

const WRAPPER_TOOLS: [&str; 5] = ["CAN", "CANConfig", "CANLink", "CANLib", "AnalyzerWrapperConfig"];

/// Tools replaced in the build environment and the extra configuration
/// arguments for the selected compiler family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapPlan {
    /// `(wrapped tool, wrapper binary)` pairs.
    pub tools: Vec<(String, String)>,
    /// Binaries copied from the wrapper bin dir under another name.
    pub copies: Vec<(String, String)>,
    pub extra_args: Vec<String>,
    /// Whether an `rm` script forcing recursive removal is installed.
    pub rm_script: bool,
}

impl WrapPlan {
    pub fn for_props(props: &Properties) -> Self {
        match props.wrapper_mode {
            WrapperMode::Cl => Self::cl(),
            WrapperMode::Clang => Self::clang(props),
        }
    }

    fn cl() -> Self {
        let tools = [
            ("cl.exe", "CLWrapper.exe"),
            ("link.exe", "LinkWrapper.exe"),
            ("lib.exe", "LibWrapper.exe"),
            ("clang-cl.exe", "CLWrapper.exe"),
            ("lld-link.exe", "LinkWrapper.exe"),
            ("llvm-lib.exe", "LibWrapper.exe"),
        ];
        Self {
            tools: pairs(&tools),
            copies: pairs(&[
                ("VsbuildWrapper.exe", "msbuild.exe"),
                ("VsbuildWrapper.exe", "devenv.exe"),
            ]),
            extra_args: Vec::new(),
            rm_script: false,
        }
    }

    fn clang(props: &Properties) -> Self {
        let compilers: Vec<String> = ["clang", "clang++"]
            .iter()
            .map(|c| format!("{}{c}{}", props.prefix, props.postfix))
            .collect();
        let ar = format!("{}ar", props.prefix);
        let ld = format!("{}ld", props.prefix);
        let ln = format!("{}ln", props.prefix);

        let mut tools: Vec<(String, String)> = compilers
            .iter()
            .map(|c| (c.clone(), "ClangWrapper".to_string()))
            .collect();
        tools.extend(pairs(&[
            (ar.as_str(), "ArWrapper"),
            (ld.as_str(), "LdWrapper"),
            (ln.as_str(), "LnWrapper"),
            ("llvm-ar", "ArWrapper"),
            ("ld.lld", "LdWrapper"),
            ("cp", "CopyMoveWrapper"),
            ("mv", "CopyMoveWrapper"),
        ]));

        let mut extra_args: Vec<String> = [
            ["-setWrapperRunFirst", "cp", "1"],
            ["-setWrapperRunFirst", "mv", "1"],
            ["-setWrappedExtraParamToBegin", "cp", "-R"],
        ]
        .iter()
        .flatten()
        .map(|s| s.to_string())
        .collect();

        if let Some(filter) = &props.hard_filter {
            let filtered = compilers
                .iter()
                .cloned()
                .chain([ar, ld, "llvm-ar".to_string(), "ld.lld".to_string()]);
            for tool in filtered {
                extra_args.push("-setWrappedParamlistFilter".to_string());
                extra_args.push(tool);
                extra_args.push(arg(filter));
            }
        }

        Self {
            tools,
            copies: Vec::new(),
            extra_args,
            rm_script: true,
        }
    }

    /// Arguments of `WrapperEnvironmentConfig`.
    pub fn environment_config_args(&self, work_dir: &Path, config_file: &Path) -> Vec<String> {
        let mut args = Vec::new();
        for (wrapped, wrapper) in &self.tools {
            args.push("-wraptools".to_string());
            args.push(wrapped.clone());
            args.push(wrapper.clone());
        }
        args.extend(self.extra_args.iter().cloned());
        args.push("-workingdir".to_string());
        args.push(arg(work_dir));
        args.push(arg(config_file));
        args
    }
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

/// Arguments of `AnalyzerWrapperConfig`.
pub fn analyzer_config_args(props: &Properties) -> Vec<String> {
    let mut args: Vec<String> = ["compiler", "linker", "archive"]
        .iter()
        .flat_map(|kind| ["-needToRun".to_string(), kind.to_string(), "1".to_string()])
        .collect();
    if let Some(filter) = &props.soft_filter {
        args.push("-linkerFilterFile".to_string());
        args.push(arg(filter));
    }
    if props.run_cppcheck {
        args.push("-runCppcheck".to_string());
        args.push("1".to_string());
    }
    if props.wrapper_mode == WrapperMode::Cl && props.no_delayed_template_parsing {
        args.push("-noDelayedTemplateParsing".to_string());
        args.push("1".to_string());
    }
    args.push("-outputDir".to_string());
    args.push(props.analysis_output_dir.clone());
    args
}

#[derive(Debug)]
pub struct WrapperTask {
    deps: Dependencies,
}

impl WrapperTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new().depends_on(names::CLEAN_RESULTS),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

struct WorkDirs {
    root: PathBuf,
    bin: PathBuf,
    log: PathBuf,
    tmp: PathBuf,
    lib: PathBuf,
}

impl WorkDirs {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            bin: root.join("bin"),
            log: root.join("log"),
            tmp: root.join("tmp"),
            lib: root.join("lib"),
        }
    }

    fn create(&self) -> Result<()> {
        for dir in [&self.bin, &self.log, &self.tmp, &self.lib] {
            fs::create_dir_all(dir).with_context(|| format!("creating dir {:?}", dir))?;
        }
        Ok(())
    }
}

impl Task for WrapperTask {
    fn name(&self) -> &str {
        names::WRAPPER
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let props = ctx.props;
        let mut result = ExecutionResult::success();
        guarded(names::WRAPPER, &mut result, |result| {
            let dirs = WorkDirs::new(&props.wrapper_tmp_dir);
            dirs.create()?;

            for tool in WRAPPER_TOOLS {
                copy_file(
                    &binary_path(&props.wrapper_tools_dir, tool),
                    &binary_path(&dirs.bin, tool),
                )?;
            }
            let tools = &props.wrapper_tools_dir;
            copy_dir_if_present(&tools.join("cppcheck"), &dirs.bin.join("cppcheck"))?;
            copy_dir_if_present(&tools.join("clang"), &dirs.lib.join("clang"))?;

            let plan = WrapPlan::for_props(props);
            debug!(mode = %props.wrapper_mode, tools = plan.tools.len(), "wrapping toolchain");
            install_wrappers(props, &plan, &dirs.bin)?;
            if plan.rm_script {
                if let Err(err) = write_rm_script(&dirs.bin.join("rm")) {
                    result.set_error(format!("Can not create the rm wrapper script: {err:#}"));
                }
            }

            let mut env = vec![
                ("WRAPPER_WORK_DIR".to_string(), arg(&dirs.root)),
                ("WRAPPER_BIN_DIR".to_string(), arg(&dirs.bin)),
                ("WRAPPER_LOG_DIR".to_string(), arg(&dirs.log)),
                ("WRAPPER_TEMP_DIR".to_string(), arg(&dirs.tmp)),
                ("WRAPPER_ENVIRONMENT".to_string(), arg(&props.temp_dir)),
                ("WRAPPER_WORK_DIR_NAME".to_string(), arg(&props.wrapper_tmp_dir_name)),
            ];

            let config_file = dirs.root.join("wrapper_environment_config.ini");
            checked_exec_env(
                ctx,
                names::WRAPPER,
                &binary_path(&props.wrapper_bin_dir, "WrapperEnvironmentConfig"),
                &plan.environment_config_args(&dirs.root, &config_file),
                &env,
                ExecMode::Hard,
                result,
            )?;
            env.push((CONFIG_FILE_ENV.to_string(), arg(&config_file)));

            checked_exec_env(
                ctx,
                names::WRAPPER,
                &binary_path(&dirs.bin, "AnalyzerWrapperConfig"),
                &analyzer_config_args(props),
                &env,
                ExecMode::Hard,
                result,
            )?;

            env.push(("PATH".to_string(), prepend_path(&dirs.bin)?));
            info!(script = %props.build_script.display(), "running wrapped build");
            checked_exec_env(
                ctx,
                names::WRAPPER,
                &props.build_script,
                &[],
                &env,
                ExecMode::Hard,
                result,
            )?;

            check_build_output(&dirs.log, result);
            Ok(())
        });
        result
    }
}

/// Escalate the result according to what the wrapped build left behind.
pub fn check_build_output(log_dir: &Path, result: &mut ExecutionResult) {
    let error_log = log_dir.join("Error.log");
    if error_log.exists() {
        result.set_error(format!(
            "The wrapper reported errors during the build. Check log: {}",
            error_log.display()
        ));
    }

    let size = |name: &str| fs::metadata(log_dir.join(name)).map(|m| m.len()).unwrap_or(0);
    if size("component.list") == 0 && size("aast.list") == 0 {
        result.set_critical_error("The wrapped build produced no components to analyze");
    }
}

fn install_wrappers(props: &Properties, plan: &WrapPlan, bin: &Path) -> Result<()> {
    let exewrapper = binary_path(&props.wrapper_bin_dir, "exewrapper");
    for (wrapped, wrapper) in &plan.tools {
        copy_file(&props.wrapper_bin_dir.join(wrapper), &bin.join(wrapper))?;
        copy_file(&exewrapper, &bin.join(wrapped))?;
    }
    for (from, to) in &plan.copies {
        copy_file(&props.wrapper_bin_dir.join(from), &bin.join(to))?;
    }
    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).with_context(|| format!("copying {:?} to {:?}", from, to))?;
    Ok(())
}

fn copy_dir_if_present(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        debug!(dir = %from.display(), "not installed; skipping copy");
        return Ok(());
    }
    for entry in WalkDir::new(from) {
        let entry = entry.with_context(|| format!("walking {:?}", from))?;
        let relative = entry.path().strip_prefix(from)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).with_context(|| format!("creating dir {:?}", target))?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn write_rm_script(path: &Path) -> Result<()> {
    fs::write(path, "#!/bin/sh\n/bin/rm -rf \"$@\"\n")
        .with_context(|| format!("writing {:?}", path))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

/// `PATH` with `dir` in front of the current value.
fn prepend_path(dir: &Path) -> Result<String> {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut paths: Vec<PathBuf> = vec![dir.to_path_buf()];
    paths.extend(std::env::split_paths(&current));
    let joined: OsString = std::env::join_paths(paths).context("building PATH")?;
    Ok(joined.to_string_lossy().into_owned())
}

