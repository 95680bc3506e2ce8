//! Single-flight dispatch of pull-based work sources.
//!
//! This module provides:
//! - Single-resolution promises for handing results back to callers
//! - A dispatcher that drains any `WorkSource` on at most one thread at a time

pub mod dispatcher;
pub mod promise;

pub use dispatcher::Dispatcher;
pub use promise::{Promise, Resolver, promise};
