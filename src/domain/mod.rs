//! Domain layer with core types, error definitions, and port traits.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// I/O priority classes.
pub mod priority;
/// Port definitions.
pub mod ports;

pub use entities::{CacheEntry, ImageKey};
pub use errors::{ConfigError, DecodeError, LoadError, TaskError};
pub use ports::{Action, Decoder, WorkSource};
pub use priority::IoPriority;
