// src/archive/mod.rs

//! Temporarily extracted static library archives.
//!
//! Static libraries produced during the wrapped build (`*.aast`) are unpacked
//! next to the archive so that their contents can be listed in a component
//! file. The extracted directories must outlive the stage that created them
//! (later analyzers read the files) and are removed when the cleanup stage
//! clears the arena, or at the latest when the arena is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::exec::ProgramRunner;

/// One archive unpacked into `content_dir`.
///
/// Dropping it removes `content_dir` and everything below it.
#[derive(Debug)]
pub struct ExtractedArchive {
    archive: PathBuf,
    content_dir: PathBuf,
    files: Vec<PathBuf>,
}

impl ExtractedArchive {
    pub fn new(archive: PathBuf, content_dir: PathBuf, files: Vec<PathBuf>) -> Self {
        Self {
            archive,
            content_dir,
            files,
        }
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Extracted regular files, sorted.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Drop for ExtractedArchive {
    fn drop(&mut self) {
        if !self.content_dir.exists() {
            return;
        }
        match fs::remove_dir_all(&self.content_dir) {
            Ok(()) => debug!(dir = %self.content_dir.display(), "removed extracted archive"),
            Err(err) => warn!(
                dir = %self.content_dir.display(),
                error = %err,
                "failed to remove extracted archive"
            ),
        }
    }
}

/// Keeps extracted archives alive for the rest of a run.
///
/// Owned by the controller and lent to tasks through their context.
#[derive(Debug, Default)]
pub struct ArchiveArena {
    archives: Vec<ExtractedArchive>,
}

impl ArchiveArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, archive: ExtractedArchive) {
        self.archives.push(archive);
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedArchive> {
        self.archives.iter()
    }

    /// Drop every archive, removing the extracted contents.
    pub fn clear(&mut self) {
        self.archives.clear();
    }
}

/// Unpacks one archive into a directory.
pub trait ArchiveExtractor {
    fn extract(&self, archive: &Path, content_dir: &Path) -> Result<ExtractedArchive>;
}

/// Extractor that shells out to a configured command.
///
/// `{archive}` and `{dir}` in the command template are replaced by the archive
/// path and the target directory. The extracted files are listed afterwards.
pub struct CommandExtractor<'a> {
    template: &'a [String],
    runner: &'a dyn ProgramRunner,
    log: PathBuf,
}

impl<'a> CommandExtractor<'a> {
    pub fn new(template: &'a [String], runner: &'a dyn ProgramRunner, log: PathBuf) -> Self {
        Self {
            template,
            runner,
            log,
        }
    }

    fn command_for(&self, archive: &Path, content_dir: &Path) -> Result<(PathBuf, Vec<String>)> {
        let Some((program, args)) = self.template.split_first() else {
            bail!("archive extraction command is empty");
        };
        let archive = archive.to_string_lossy();
        let dir = content_dir.to_string_lossy();
        let args = args
            .iter()
            .map(|a| a.replace("{archive}", &archive).replace("{dir}", &dir))
            .collect();
        Ok((PathBuf::from(program), args))
    }
}

impl ArchiveExtractor for CommandExtractor<'_> {
    fn extract(&self, archive: &Path, content_dir: &Path) -> Result<ExtractedArchive> {
        if content_dir.exists() {
            fs::remove_dir_all(content_dir)
                .with_context(|| format!("removing stale {:?}", content_dir))?;
        }
        fs::create_dir_all(content_dir)
            .with_context(|| format!("creating dir {:?}", content_dir))?;

        // Owned before the command runs so a failure still cleans up.
        let mut extracted =
            ExtractedArchive::new(archive.to_path_buf(), content_dir.to_path_buf(), Vec::new());

        let (program, args) = self.command_for(archive, content_dir)?;
        let mut log = crate::exec::command::open_log(&self.log)?;
        let code = self
            .runner
            .run(&program, &args, &mut log)
            .with_context(|| format!("extracting {:?}", archive))?;
        if code != 0 {
            bail!(
                "extracting {} failed with exit code {code}. Check log: {}",
                archive.display(),
                self.log.display()
            );
        }

        extracted.files = list_files(content_dir)?;
        debug!(
            archive = %archive.display(),
            files = extracted.files.len(),
            "archive extracted"
        );
        Ok(extracted)
    }
}

/// Every regular file below `dir`, sorted.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("walking {:?}", dir))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
