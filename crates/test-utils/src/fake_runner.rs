use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use osa_controller::exec::ProgramRunner;

/// One recorded program run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// File name of the program without the executable suffix.
    pub fn tool(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

type Script = Box<dyn Fn(&Path, &[String]) -> i32 + Send + Sync>;

/// A `ProgramRunner` that never spawns anything.
///
/// Every call is recorded; the exit code comes from the script. A run with a
/// non-zero code writes one line to its log, a successful run writes nothing.
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    script: Script,
}

impl FakeRunner {
    /// Every program exits with 0.
    pub fn succeeding() -> Self {
        Self::with_script(|_, _| 0)
    }

    pub fn with_script<F>(script: F) -> Self
    where
        F: Fn(&Path, &[String]) -> i32 + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        }
    }

    /// Programs whose file stem is in `failing` exit with 1.
    pub fn failing_tools(failing: &[&str]) -> Self {
        let failing: Vec<String> = failing.iter().map(|s| s.to_string()).collect();
        Self::with_script(move |program, _| {
            let stem = program
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if failing.contains(&stem) { 1 } else { 0 }
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls to the program with file stem `tool`.
    pub fn calls_to(&self, tool: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.tool() == tool)
            .collect()
    }
}

impl ProgramRunner for FakeRunner {
    fn run_with_env(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
        log: &mut dyn Write,
    ) -> anyhow::Result<i32> {
        self.calls.lock().unwrap().push(Invocation {
            program: program.to_path_buf(),
            args: args.to_vec(),
            env: env.to_vec(),
        });
        let code = (self.script)(program, args);
        if code != 0 {
            writeln!(log, "{} {:?} exited with {code}", program.display(), args)?;
        }
        Ok(code)
    }
}
