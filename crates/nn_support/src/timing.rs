// nn_support/timing - Coarse operation timers
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Accumulates wall-clock totals per labelled operation.
#[derive(Debug, Default)]
pub struct TimingSet {
    totals: Mutex<FxHashMap<&'static str, TimingEntry>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingEntry {
    pub total: Duration,
    pub count: u64,
}

impl TimingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, label: &'static str, elapsed: Duration) {
        let mut totals = self.totals.lock();
        let entry = totals.entry(label).or_default();
        entry.total += elapsed;
        entry.count += 1;
    }

    /// Starts a timer that records into this set when dropped.
    pub fn time(&self, label: &'static str) -> TimerGuard<'_> {
        TimerGuard {
            set: self,
            label,
            start: Instant::now(),
        }
    }

    pub fn report(&self) -> TimingReport {
        let totals = self.totals.lock();
        let mut entries: Vec<(&'static str, TimingEntry)> =
            totals.iter().map(|(label, entry)| (*label, *entry)).collect();
        entries.sort_by_key(|(label, _)| *label);
        TimingReport { entries }
    }
}

pub struct TimerGuard<'a> {
    set: &'a TimingSet,
    label: &'static str,
    start: Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.set.record(self.label, self.start.elapsed());
    }
}

/// Snapshot of accumulated timings, sorted by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingReport {
    entries: Vec<(&'static str, TimingEntry)>,
}

impl TimingReport {
    pub fn entries(&self) -> &[(&'static str, TimingEntry)] {
        &self.entries
    }

    pub fn entry(&self, label: &str) -> Option<TimingEntry> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == label)
            .map(|(_, entry)| *entry)
    }
}
