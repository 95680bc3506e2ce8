//! Domain error types.

mod config_error;
mod decode_error;
mod load_error;
mod task_error;

pub use config_error::ConfigError;
pub use decode_error::DecodeError;
pub use load_error::{LoadError, LoadResult};
pub use task_error::TaskError;
pub(crate) use task_error::panic_message;
