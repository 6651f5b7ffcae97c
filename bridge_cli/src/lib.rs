pub mod error;
pub mod process;
pub mod surface;

pub use error::CliError;
pub use process::{ProcessLoader, ProcessModule};
pub use surface::{FileOutput, StdoutOutput};
