//! Infrastructure layer: dispatch machinery and the subsystems built on it.

/// Application configuration.
pub mod config;
/// Single-flight dispatch and promises.
pub mod dispatch;
/// Image caching and decoding.
pub mod image;
/// Serialized disk I/O.
pub mod io;

pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use dispatch::{Dispatcher, Promise, Resolver};
pub use image::{CacheConfig, CacheStats, EvictionPolicy, ImageCache, ImageCrateDecoder};
pub use io::{IoScheduler, LaneDepths};
