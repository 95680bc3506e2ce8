//! Serialized disk access.

pub mod scheduler;

pub use scheduler::{IoLanes, IoScheduler, LaneDepths};
