#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use osa_controller::config::properties::binary_path;
use osa_controller::config::{Overrides, Properties, load_from_str};
use tempfile::TempDir;

/// Fixed timestamp used for the timed result directory.
pub const TEST_DATE: &str = "2024-01-02-03-04-05";

/// A scratch project: the temp dir keeps every path of `props` alive.
pub struct TestProject {
    pub root: TempDir,
    pub props: Properties,
}

impl TestProject {
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Create empty executables named `names` in the tools directory.
    pub fn install_tools(&self, names: &[&str]) {
        for name in names {
            touch(&binary_path(&self.props.tools_dir, name));
        }
    }

    /// Create the working directories a real run prepares up front.
    pub fn prepare_dirs(&self) {
        osa_controller::prepare_dirs(&self.props).expect("prepare dirs");
    }

    /// Write a list file under the wrapper log directory.
    pub fn write_wrapper_list(&self, name: &str, items: &[&str]) -> PathBuf {
        let path = self.props.wrapper_log_dir().join(name);
        osa_controller::fs::write_string_list(&path, items).expect("write list");
        path
    }
}

/// Create `path` and its parent directories as an empty file.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, b"").expect("touch file");
}

/// Builder for a [`TestProject`] backed by a real TOML config.
pub struct PropertiesBuilder {
    name: String,
    run: Vec<String>,
    extra: Vec<String>,
    max_threads: usize,
    current_date: String,
}

impl PropertiesBuilder {
    pub fn new() -> Self {
        Self {
            name: "demo".to_string(),
            run: Vec::new(),
            extra: Vec::new(),
            max_threads: 2,
            current_date: TEST_DATE.to_string(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Add a `key = value` line to `[run]`; `value` is raw TOML.
    pub fn run_option(mut self, key: &str, value: &str) -> Self {
        self.run.push(format!("{key} = {value}"));
        self
    }

    /// Append raw TOML (whole sections) to the config.
    pub fn section(mut self, toml: &str) -> Self {
        self.extra.push(toml.to_string());
        self
    }

    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = n;
        self
    }

    pub fn current_date(mut self, date: &str) -> Self {
        self.current_date = date.to_string();
        self
    }

    pub fn build(self) -> TestProject {
        let root = TempDir::new().expect("create temp dir");
        let base = root.path();
        fs::create_dir_all(base.join("project")).expect("create project dir");

        let mut toml = format!(
            "[project]\nname = \"{}\"\nresults_dir = '{}'\nbuild_script = '{}'\nbase_dir = '{}'\n\n[run]\n",
            self.name,
            base.join("results").display(),
            base.join("build.sh").display(),
            base.join("project").display(),
        );
        for line in &self.run {
            toml.push_str(line);
            toml.push('\n');
        }
        for section in &self.extra {
            toml.push('\n');
            toml.push_str(section);
            toml.push('\n');
        }

        let cfg = load_from_str(&toml).expect("valid test config");
        let overrides = Overrides {
            max_threads: Some(self.max_threads),
            fault_tolerant: None,
            current_date: Some(self.current_date),
            toolchain_dir: Some(base.join("toolchain")),
        };
        let props = Properties::resolve(&cfg, &overrides).expect("resolve properties");
        TestProject { root, props }
    }
}

impl Default for PropertiesBuilder {
    fn default() -> Self {
        Self::new()
    }
}
