//! Lock-free receive counters, updated once per packet by the receive thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome counts for one packet, including every element of its bundles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketReport {
    /// Messages that reached a handler and queued a callback.
    pub handled: u32,
    /// Well-formed messages with an address no handler serves.
    pub unhandled: u32,
    /// Messages or bundle elements dropped as malformed.
    pub malformed: u32,
    /// Future-dated bundles dropped without dispatching their contents.
    pub deferred_dropped: u32,
}

#[derive(Debug, Default)]
pub struct ReceiveStats {
    packets: AtomicU64,
    handled: AtomicU64,
    unhandled: AtomicU64,
    malformed: AtomicU64,
    deferred_dropped: AtomicU64,
}

impl ReceiveStats {
    pub fn record(&self, report: &PacketReport) {
        self.packets.fetch_add(1, Ordering::Relaxed);
        self.handled.fetch_add(report.handled as u64, Ordering::Relaxed);
        self.unhandled.fetch_add(report.unhandled as u64, Ordering::Relaxed);
        self.malformed.fetch_add(report.malformed as u64, Ordering::Relaxed);
        self.deferred_dropped
            .fetch_add(report.deferred_dropped as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets: self.packets.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            deferred_dropped: self.deferred_dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub packets: u64,
    pub handled: u64,
    pub unhandled: u64,
    pub malformed: u64,
    pub deferred_dropped: u64,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} packets: {} handled, {} unhandled, {} malformed, {} future bundles dropped",
            self.packets, self.handled, self.unhandled, self.malformed, self.deferred_dropped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates() {
        let stats = ReceiveStats::default();
        stats.record(&PacketReport { handled: 2, unhandled: 1, ..Default::default() });
        stats.record(&PacketReport { malformed: 1, deferred_dropped: 1, ..Default::default() });

        let snap = stats.snapshot();
        assert_eq!(snap.packets, 2);
        assert_eq!(snap.handled, 2);
        assert_eq!(snap.unhandled, 1);
        assert_eq!(snap.malformed, 1);
        assert_eq!(snap.deferred_dropped, 1);
    }
}
