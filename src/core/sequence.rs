//! Request sequencing so only the most recent fetch may update a view

use std::fmt;

/// Monotonic identifier attached to each issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues request ids and fences out stale responses
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new id; every previously issued id becomes stale
    pub fn issue(&mut self) -> RequestId {
        self.issued += 1;
        RequestId(self.issued)
    }

    /// Whether `id` is the most recently issued request
    pub fn is_latest(&self, id: RequestId) -> bool {
        self.issued != 0 && id.0 == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_wins() {
        let mut seq = RequestSequencer::new();
        let slow = seq.issue();
        let fast = seq.issue();
        assert!(fast > slow);
        assert!(seq.is_latest(fast));
        assert!(!seq.is_latest(slow));
    }

    #[test]
    fn test_nothing_is_latest_before_first_issue() {
        let mut other = RequestSequencer::new();
        let foreign = other.issue();
        assert!(!RequestSequencer::new().is_latest(foreign));
    }

    #[test]
    fn test_display() {
        let mut seq = RequestSequencer::new();
        assert_eq!(seq.issue().to_string(), "#1");
    }
}
