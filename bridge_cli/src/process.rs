use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use async_trait::async_trait;
use bridge_core::{ExecutionModule, ModuleError, ModuleLoader};
use tracing::debug;

/// Finds an interpreter executable. A bare name is looked up on `PATH`, anything with a
/// directory component is taken as a path.
pub struct ProcessLoader {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessLoader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

#[async_trait(?Send)]
impl ModuleLoader for ProcessLoader {
    type Module = ProcessModule;

    async fn load(&self) -> Result<ProcessModule, ModuleError> {
        let program = resolve_program(&self.program, env::var_os("PATH"))
            .ok_or_else(|| ModuleError(format!("interpreter {} not found", self.program.display())))?;
        debug!(program = %program.display(), "resolved interpreter");
        Ok(ProcessModule {
            program,
            args: self.args.clone(),
        })
    }
}

/// Runs the interpreter once per program: source on stdin, output from stdout.
///
/// `interpret` blocks the calling thread until the interpreter exits. Drive it with a blocking
/// executor (the `bridge` binary uses `pollster::block_on`), never a shared one.
pub struct ProcessModule {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessModule {
    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait(?Send)]
impl ExecutionModule for ProcessModule {
    async fn interpret(&self, source: &str) -> Result<String, ModuleError> {
        let spawn_failed =
            |e: std::io::Error| ModuleError(format!("couldn't run {}: {}", self.program.display(), e));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_failed)?;

        // Feed stdin from another thread so a chatty interpreter can't fill its stdout pipe
        // while we're still writing
        let writer = child.stdin.take().map(|mut stdin| {
            let source = source.to_string();
            thread::spawn(move || stdin.write_all(source.as_bytes()))
        });

        let output = child.wait_with_output().map_err(spawn_failed)?;
        if let Some(writer) = writer {
            // A broken pipe just means the interpreter stopped reading, its exit status says
            // whether that was a problem
            let _ = writer.join();
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(if stderr.is_empty() {
                ModuleError(format!("interpreter exited with {}", output.status))
            } else {
                ModuleError(stderr.to_string())
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|_| ModuleError("interpreter output is not valid UTF-8".into()))
    }
}

pub(crate) fn resolve_program(program: &Path, path_var: Option<OsString>) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }
    env::split_paths(&path_var?)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
