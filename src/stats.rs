//! Server-wide connection counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the connection dispatcher
///
/// The live-stream count itself lives with the sink pool; these track the
/// accept loop's view for logging and diagnostics.
#[derive(Debug, Default)]
pub struct ServerStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl ServerStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Total connections ever accepted by the listener
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Connections rejected because the pool was exhausted
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = ServerStats::new();
        assert_eq!(stats.accepted(), 0);
        assert_eq!(stats.rejected(), 0);

        stats.record_accepted();
        stats.record_accepted();
        stats.record_rejected();

        assert_eq!(stats.accepted(), 2);
        assert_eq!(stats.rejected(), 1);
    }
}
