//! Image handling infrastructure.
//!
//! This module provides:
//! - A bounded, asynchronous image cache driven by its own dispatcher
//! - Cache sizing, key and eviction settings
//! - A default decoder built on the `image` crate

pub mod cache;
pub mod config;
pub mod decoder;

pub use cache::{CacheStats, ImageCache};
pub use config::{CacheConfig, DEFAULT_MAX_ITEMS, DEFAULT_PURGE_SIZE, EvictionPolicy};
pub use decoder::ImageCrateDecoder;
