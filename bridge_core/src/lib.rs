pub mod bridge;
pub mod error;
pub mod module;
pub mod program;
pub mod surface;

pub use bridge::{Bridge, BridgeState};
pub use error::{BridgeError, ModuleError, SurfaceError};
pub use module::{ExecutionModule, ModuleCache, ModuleLoader};
pub use program::ProgramText;
pub use surface::{OutputSurface, RunTrigger};
