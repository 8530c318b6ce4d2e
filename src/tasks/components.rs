// src/tasks/components.rs

//! Static library handling after the wrapped build.
//!
//! The wrapper records every static library it saw in `aast.list`. Each one
//! is unpacked and its member list written to a sibling `.component` file.
//! [`LinkStaticLibsTask`] then adds those component files to
//! `component.list`; [`StaticLibHandlerTask`] instead inlines the archive
//! members into every component that references the library.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveExtractor, CommandExtractor};
use crate::config::Properties;
use crate::exec::command::arg;
use crate::fs::{append_string_list, load_string_list, sorted_unique, write_string_list};
use crate::task::{Dependencies, ExecutionResult, Task, TaskContext, TaskName, guarded};
use crate::tasks::names;

const ARCHIVE_EXT: &str = "aast";
const COMPONENT_EXT: &str = "component";

/// `lib.aast` -> `lib.component`. Entries too short to carry a name yield `None`.
pub fn component_name(archive: &str) -> Option<String> {
    if archive.chars().count() <= ARCHIVE_EXT.len() + 1 {
        return None;
    }
    let cut = archive
        .char_indices()
        .rev()
        .nth(ARCHIVE_EXT.len() - 1)
        .map(|(i, _)| i)?;
    Some(format!("{}{COMPONENT_EXT}", &archive[..cut]))
}

/// Unpack every archive listed in `aast.list`, writing one component file per
/// archive. Returns the component files written.
fn unpack_archives(ctx: &mut TaskContext<'_>, task: &str) -> Result<Vec<String>> {
    let props = ctx.props;
    let list = props.wrapper_log_dir().join("aast.list");
    let archives = sorted_unique(load_string_list(&list)?.unwrap_or_default());
    if archives.is_empty() {
        debug!(task = %task, "no static libraries to unpack");
        return Ok(Vec::new());
    }

    let log = props.task_log_path(task);
    let extractor = CommandExtractor::new(&props.extract_cmd, ctx.runner, log);
    let mut components = Vec::new();
    for archive in archives {
        let Some(component) = component_name(&archive) else {
            debug!(entry = %archive, "ignoring short aast entry");
            continue;
        };
        let content_dir = PathBuf::from(format!("{archive}.content"));
        let extracted = extractor.extract(Path::new(&archive), &content_dir)?;

        let members: Vec<String> = extracted.files().iter().map(|f| arg(f)).collect();
        write_string_list(Path::new(&component), &members)?;
        info!(archive = %archive, members = members.len(), "static library unpacked");

        ctx.arena.push(extracted);
        components.push(component);
    }
    Ok(components)
}

/// Links static libraries into the analysis as standalone components.
#[derive(Debug)]
pub struct LinkStaticLibsTask {
    deps: Dependencies,
}

impl LinkStaticLibsTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new().depends_on(names::WRAPPER),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

impl Task for LinkStaticLibsTask {
    fn name(&self) -> &str {
        names::LINK_STATIC_LIBS
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let mut result = ExecutionResult::success();
        guarded(names::LINK_STATIC_LIBS, &mut result, |_| {
            let components = unpack_archives(ctx, names::LINK_STATIC_LIBS)?;
            if !components.is_empty() {
                let list = ctx.props.wrapper_log_dir().join("component.list");
                append_string_list(&list, &components)?;
            }
            Ok(())
        });
        result
    }
}

/// Expands static libraries into the components that link them.
#[derive(Debug)]
pub struct StaticLibHandlerTask {
    deps: Dependencies,
}

impl StaticLibHandlerTask {
    pub fn new(_props: &Properties) -> Self {
        Self {
            deps: Dependencies::new().depends_on(names::WRAPPER),
        }
    }

    pub fn boxed(props: &Properties) -> Box<dyn Task> {
        Box::new(Self::new(props))
    }
}

impl Task for StaticLibHandlerTask {
    fn name(&self) -> &str {
        names::STATIC_LIB_HANDLER
    }

    fn dependencies(&self) -> &[TaskName] {
        self.deps.as_slice()
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> ExecutionResult {
        let mut result = ExecutionResult::success();
        guarded(names::STATIC_LIB_HANDLER, &mut result, |result| {
            unpack_archives(ctx, names::STATIC_LIB_HANDLER)?;

            let list = ctx.props.wrapper_log_dir().join("component.list");
            for component in load_string_list(&list)?.unwrap_or_default() {
                if let Err(err) = expand_component(Path::new(&component)) {
                    result.set_warning(format!("Failed to expand {component}: {err:#}"));
                }
            }
            Ok(())
        });
        result
    }
}

/// Replace every archive entry of a component file with the archive members.
pub fn expand_component(component: &Path) -> Result<()> {
    let Some(entries) = load_string_list(component)? else {
        return Ok(());
    };

    let mut expanded = Vec::with_capacity(entries.len());
    let mut changed = false;
    for entry in entries {
        let is_archive = Path::new(&entry)
            .extension()
            .is_some_and(|ext| ext == ARCHIVE_EXT);
        let members = match component_name(&entry).filter(|_| is_archive) {
            Some(name) => load_string_list(Path::new(&name))?,
            None => None,
        };
        match members {
            Some(members) => {
                expanded.extend(members);
                changed = true;
            }
            None => {
                if is_archive {
                    warn!(entry = %entry, "no component file for archive; keeping entry");
                }
                expanded.push(entry);
            }
        }
    }

    if changed {
        write_string_list(component, &expanded)?;
    }
    Ok(())
}
