//! Domain entities.

mod cache_entry;
mod image_key;

pub use cache_entry::{CacheEntry, ImageResult};
pub use image_key::{CaseSensitivity, ImageKey};
