use thiserror::Error;

/// Failure reported by a `ModuleLoader` or an `ExecutionModule`.
#[derive(Error, Eq, Clone, PartialEq, Debug)]
#[error("{0}")]
pub struct ModuleError(pub String);

impl From<String> for ModuleError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ModuleError {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

/// Failure reported by an `OutputSurface` when it can't take a new value.
#[derive(Error, Eq, Clone, PartialEq, Debug)]
#[error("{0}")]
pub struct SurfaceError(pub String);

#[derive(Error, Eq, Clone, PartialEq, Debug)]
pub enum BridgeError {
    #[error("failed to load execution module: {0}")]
    ModuleLoad(ModuleError),

    #[error("execution failed: {0}")]
    Execution(ModuleError),

    #[error("a run is already in progress")]
    Busy,

    #[error("could not write output: {0}")]
    Output(#[from] SurfaceError),
}

impl BridgeError {
    /// The text shown on the output surface in place of a program's output.
    pub fn render(&self) -> String {
        format!("error: {}", self)
    }

    /// Short stable name for the error kind, used by hosts that report errors as data.
    pub fn kind(&self) -> &'static str {
        use BridgeError::*;
        match self {
            ModuleLoad(_) => "module_load",
            Execution(_) => "execution",
            Busy => "busy",
            Output(_) => "output",
        }
    }
}
