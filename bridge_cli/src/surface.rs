use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use bridge_core::{OutputSurface, SurfaceError};

/// Writes each result to stdout as-is. With `terminate_lines`, a result not ending in a
/// newline gets one, so the next prompt starts on its own line.
pub struct StdoutOutput {
    terminate_lines: bool,
}

impl StdoutOutput {
    pub fn new(terminate_lines: bool) -> Self {
        Self { terminate_lines }
    }
}

impl OutputSurface for StdoutOutput {
    fn show(&mut self, text: &str) -> Result<(), SurfaceError> {
        let mut stdout = io::stdout().lock();
        let mut write = || -> io::Result<()> {
            stdout.write_all(text.as_bytes())?;
            if self.terminate_lines && !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()
        };
        write().map_err(|e| SurfaceError(e.to_string()))
    }
}

/// Replaces the contents of a file with each result.
pub struct FileOutput {
    path: PathBuf,
}

impl FileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSurface for FileOutput {
    fn show(&mut self, text: &str) -> Result<(), SurfaceError> {
        fs::write(&self.path, text)
            .map_err(|e| SurfaceError(format!("{}: {}", self.path.display(), e)))
    }
}
