use std::io;
use std::path::PathBuf;

use bridge_core::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("File does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read {}: {}", .0.display(), .1)]
    Read(PathBuf, io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Run(#[from] BridgeError),
}
