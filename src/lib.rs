//! imgflight - single-flight work dispatch for image viewers.
//!
//! This crate provides a cooperative dispatcher that drains any pull-based
//! work source on at most one thread at a time, and two subsystems built on
//! it: a priority-ordered disk I/O serializer and a bounded image cache.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Domain layer containing core types, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing the dispatcher and the caches built on it.
pub mod infrastructure;

pub use domain::{DecodeError, Decoder, IoPriority, LoadError, TaskError, WorkSource};
pub use infrastructure::{Dispatcher, ImageCache, IoScheduler, Promise};

/// Current version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = "imgflight";
