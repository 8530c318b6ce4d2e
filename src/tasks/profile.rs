// src/tasks/profile.rs

//! Prepares the per-run rule files and decides the optional metrics.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::config::Properties;
use crate::task::{Dependencies, ExecutionResult, Task, TaskContext, TaskName, guarded};
use crate::tasks::names;

const RULE_FILES: [&str; 5] = [
    "Cppcheck.rul.md",
    "Cppcheck.rul_metadata.md",
    "ClangTidy.rul.md",
    "ClangTidy.rul_metadata.md",
    "MetricHunter.threshold",
];

pub const UDM_RULE_FILE: &str = "UDM.rul.md";
pub const CLANG_TIDY_CONFIG: &str = "ClangTidy.conf";

#[derive(Debug)]
pub struct ProfileTask {
    deps: Dependencies,
}

impl ProfileTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new().depends_on(names::CAN2LIM),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

impl Task for ProfileTask {
    fn name(&self) -> &str {
        names::PROFILE
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let props = ctx.props;
        let mut result = ExecutionResult::success();
        guarded(names::PROFILE, &mut result, |_| {
            fs::create_dir_all(&props.temp_dir)
                .with_context(|| format!("creating dir {:?}", props.temp_dir))?;

            for file in RULE_FILES {
                if let Some(copied) = copy_rule_file(&props.tools_dir, &props.temp_dir, file)? {
                    ctx.state.profile.rule_files.push(copied);
                }
            }

            let config = props.temp_dir.join(CLANG_TIDY_CONFIG);
            fs::write(&config, clang_tidy_config(&props.clang_tidy_disabled_checks))
                .with_context(|| format!("writing {:?}", config))?;
            ctx.state.profile.clang_tidy_config = Some(config);

            let udm_rules = copy_rule_file(&props.tools_dir, &props.temp_dir, UDM_RULE_FILE)?;
            let run_udm = decide_udm(props.run_udm, udm_rules.is_some())?;
            info!(run_udm, "user defined metrics decided");
            ctx.state.profile.run_udm = run_udm;
            if let Some(rules) = udm_rules {
                ctx.state.profile.rule_files.push(rules);
            }
            Ok(())
        });
        result
    }
}

/// Copy `name` from `from` to `to` if it exists. Returns the new path.
fn copy_rule_file(from: &Path, to: &Path, name: &str) -> Result<Option<PathBuf>> {
    let source = from.join(name);
    if !source.is_file() {
        debug!(file = %source.display(), "rule file not installed");
        return Ok(None);
    }
    let target = to.join(name);
    fs::copy(&source, &target)
        .with_context(|| format!("copying {:?} to {:?}", source, target))?;
    Ok(Some(target))
}

/// Render the clang-tidy configuration enabling every check except `disabled`.
pub fn clang_tidy_config(disabled: &[String]) -> String {
    let mut checks = String::from("*");
    for check in disabled {
        checks.push_str(",-");
        checks.push_str(check);
    }
    format!(
        "Checks: '{checks}'\nWarningsAsErrors: ''\nHeaderFilterRegex: ''\nAnalyzeTemporaryDtors: false\n"
    )
}

/// Whether user defined metrics run.
///
/// Without an explicit setting they run exactly when rules are installed. An
/// explicit request without rules is an error.
pub fn decide_udm(configured: Option<bool>, rules_present: bool) -> Result<bool> {
    match configured {
        None => Ok(rules_present),
        Some(false) => Ok(false),
        Some(true) if rules_present => Ok(true),
        Some(true) => bail!("user defined metrics requested but {UDM_RULE_FILE} is not installed"),
    }
}
