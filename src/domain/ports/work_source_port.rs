//! Pull contract drained by a dispatcher.

/// A zero-argument unit of deferred work.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Queue of work a dispatcher drains one item at a time.
///
/// Implementations own their queues and know nothing about threads. Every
/// `Action` handed out is responsible for reporting its own outcome; the
/// dispatcher only runs it.
pub trait WorkSource: Send + Sync + 'static {
    /// Returns true if `try_take_work` would currently yield an item.
    fn has_work(&self) -> bool;

    /// Removes and returns the next item, or `None` when idle.
    fn try_take_work(&self) -> Option<Action>;
}
