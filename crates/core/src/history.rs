//! Time-bounded history of corridor snapshots.

use std::collections::VecDeque;

use crate::model::{Snapshot, WorldStatus};
use crate::util::{now_ms, EpochMs};

/// Snapshots older than this (relative to the latest insertion) are evicted.
pub const HISTORY_WINDOW_MS: i64 = 60 * 60 * 1000;

/// Append-only snapshot sequence covering the last 60 minutes.
///
/// Eviction runs on every insertion. Reads hand out owned copies, so nothing
/// returned from here can reach back into stored state.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<Snapshot>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps `status` with the current time and appends it.
    pub fn record(&mut self, status: WorldStatus) {
        self.record_at(status, now_ms());
    }

    /// Stamps `status` with `now` and appends it, then evicts entries older
    /// than `now - HISTORY_WINDOW_MS`.
    pub fn record_at(&mut self, status: WorldStatus, now: EpochMs) {
        self.entries.push_back(Snapshot::new(status, now));

        let cutoff = now - HISTORY_WINDOW_MS;
        while self
            .entries
            .front()
            .is_some_and(|oldest| oldest.timestamp < cutoff)
        {
            self.entries.pop_front();
        }
    }

    /// Copy of the stored snapshots, oldest first.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.entries.iter().cloned().collect()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded inside the window.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotSource;

    const MIN: i64 = 60 * 1000;

    fn status(delay: f64) -> WorldStatus {
        WorldStatus {
            route_id: "10".into(),
            segment_start_stop_id: "S2".into(),
            segment_end_stop_id: "S3".into(),
            avg_delay_minutes: delay,
            trips_impacted: 0,
            riders_estimated: 0,
            source: SnapshotSource::Simulated,
        }
    }

    #[test]
    fn evicts_entries_older_than_window() {
        let mut h = History::new();
        let t0 = 1_000_000_000;
        h.record_at(status(1.0), t0);
        h.record_at(status(2.0), t0 + 30 * MIN);
        h.record_at(status(3.0), t0 + 61 * MIN);

        let snaps = h.snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].delay(), 2.0);
        assert_eq!(snaps[1].delay(), 3.0);
    }

    #[test]
    fn entry_exactly_at_cutoff_survives() {
        let mut h = History::new();
        let t0 = 1_000_000_000;
        h.record_at(status(1.0), t0);
        h.record_at(status(2.0), t0 + HISTORY_WINDOW_MS);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn snapshots_are_copies() {
        let mut h = History::new();
        h.record_at(status(4.0), 1_000);
        let mut copy = h.snapshots();
        copy[0].status.avg_delay_minutes = 99.0;
        copy.clear();
        assert_eq!(h.snapshots()[0].delay(), 4.0);
        assert_eq!(h.latest().map(|s| s.timestamp), Some(1_000));
    }

    #[test]
    fn negative_inputs_are_stored_as_is() {
        let mut h = History::new();
        let mut s = status(-5.0);
        s.riders_estimated = -10;
        h.record_at(s, 1_000);
        let snap = &h.snapshots()[0];
        assert_eq!(snap.delay(), -5.0);
        assert_eq!(snap.status.riders_estimated, -10);
    }
}
