// src/fs/mod.rs

//! File-list interchange between pipeline stages.
//!
//! A list file holds one path per line, unquoted, `\n` terminated. The wrapper
//! writes `ast.list`, `aast.list` and `component.list`; later stages read and
//! extend them.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Read a list file. Blank lines and trailing `\r` are dropped.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_string_list(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading list file {:?}", path))?;
    Ok(Some(
        content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    ))
}

/// Sort and deduplicate.
pub fn sorted_unique(mut items: Vec<String>) -> Vec<String> {
    items.sort();
    items.dedup();
    items
}

/// Replace `path` with `items`, one per line.
pub fn write_string_list<S: AsRef<str>>(path: &Path, items: &[S]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }
    fs::write(path, render(items)).with_context(|| format!("writing list file {:?}", path))
}

/// Append `items` to `path`, creating it if needed.
pub fn append_string_list<S: AsRef<str>>(path: &Path, items: &[S]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening list file {:?}", path))?;
    file.write_all(render(items).as_bytes())
        .with_context(|| format!("appending to list file {:?}", path))
}

/// Whether a list file is missing or holds no entries.
pub fn list_is_empty(path: &Path) -> Result<bool> {
    Ok(load_string_list(path)?.is_none_or(|items| items.is_empty()))
}

/// Delete `path` if it is a zero-byte file. Returns whether it was removed.
pub fn remove_if_empty(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() == 0 => {
            fs::remove_file(path).with_context(|| format!("removing empty file {:?}", path))?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn render<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(item.as_ref());
        out.push('\n');
    }
    out
}
