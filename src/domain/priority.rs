//! Priority classes for serialized disk work.

/// Priority lane for work scheduled on the I/O scheduler.
///
/// Ordered so that `Asap > General > Background`. Work within one class
/// runs in submission order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IoPriority {
    /// Prefetching and other work nobody is waiting on.
    Background,
    /// Regular loads, e.g. preloading neighbours of the current image.
    #[default]
    General,
    /// Work a caller is actively waiting for.
    Asap,
}

impl IoPriority {
    /// All priorities, highest first. This is the dequeue order.
    pub const DESCENDING: [Self; 3] = [Self::Asap, Self::General, Self::Background];
}

impl std::fmt::Display for IoPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Background => write!(f, "background"),
            Self::General => write!(f, "general"),
            Self::Asap => write!(f, "asap"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(IoPriority::Asap > IoPriority::General);
        assert!(IoPriority::General > IoPriority::Background);

        let mut sorted = vec![IoPriority::General, IoPriority::Asap, IoPriority::Background];
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sorted, IoPriority::DESCENDING);
    }
}
