//! Rolling requests-per-window tracker.
//!
//! # Responsibilities
//! - Keep one ring of slot counters per (route pattern, method)
//! - Count each observed request in the current slot
//! - Rotate the ring on a fixed interval, dropping the oldest slot
//!
//! # Design Decisions
//! - O(slots) memory per route, O(1) per observation
//! - Counters are atomics; the ticker is the only writer of the cursor
//! - `observe` bumps the total before the slot and `tick` subtracts only what
//!   it cleared, so the running total never underflows
//! - Snapshots may be torn across series; rates are approximate

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

/// Identifies one tracked series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeriesKey {
    pub path: String,
    pub method: String,
}

impl SeriesKey {
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
        }
    }
}

/// Rate of one series at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesRate {
    pub method: String,
    pub path: String,
    /// Requests observed within the trailing window.
    pub count: u64,
}

#[derive(Debug)]
struct BucketSeries {
    slots: Box<[AtomicU64]>,
    total: AtomicU64,
}

impl BucketSeries {
    fn new(slot_count: usize) -> Self {
        Self {
            slots: (0..slot_count).map(|_| AtomicU64::new(0)).collect(),
            total: AtomicU64::new(0),
        }
    }
}

/// Sliding-window request counter for all registered routes.
#[derive(Debug)]
pub struct RateTracker {
    series: DashMap<SeriesKey, Arc<BucketSeries>>,
    cursor: AtomicUsize,
    slot_count: usize,
    interval: Duration,
}

impl RateTracker {
    /// Create a tracker with `window / interval` slots (at least one).
    pub fn new(window: Duration, interval: Duration) -> Self {
        let slot_count = if interval.is_zero() {
            1
        } else {
            (window.as_nanos() / interval.as_nanos()).max(1) as usize
        };
        Self {
            series: DashMap::new(),
            cursor: AtomicUsize::new(0),
            slot_count,
            interval,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start tracking a series. Registering twice keeps the existing counts.
    pub fn register(&self, key: SeriesKey) {
        let slot_count = self.slot_count;
        self.series
            .entry(key)
            .or_insert_with(|| Arc::new(BucketSeries::new(slot_count)));
    }

    /// Count one request. Unknown series are ignored.
    pub fn observe(&self, key: &SeriesKey) {
        let Some(series) = self.series.get(key).map(|s| Arc::clone(s.value())) else {
            return;
        };
        series.total.fetch_add(1, Ordering::AcqRel);
        let slot = self.cursor.load(Ordering::Acquire);
        series.slots[slot].fetch_add(1, Ordering::AcqRel);
    }

    /// Advance the ring by one slot and forget what that slot held.
    pub fn tick(&self) {
        let next = (self.cursor.load(Ordering::Acquire) + 1) % self.slot_count;
        self.cursor.store(next, Ordering::Release);
        for entry in self.series.iter() {
            let series = entry.value();
            let expired = series.slots[next].swap(0, Ordering::AcqRel);
            if expired > 0 {
                series.total.fetch_sub(expired, Ordering::AcqRel);
            }
        }
    }

    /// Count for one series, if tracked.
    pub fn count(&self, key: &SeriesKey) -> Option<u64> {
        self.series
            .get(key)
            .map(|s| s.value().total.load(Ordering::Acquire))
    }

    #[cfg(test)]
    fn slot_sum(&self, key: &SeriesKey) -> Option<u64> {
        self.series
            .get(key)
            .map(|s| s.value().slots.iter().map(|slot| slot.load(Ordering::Acquire)).sum())
    }

    /// Current window counts of every series, sorted by path then method.
    pub fn snapshot(&self) -> Vec<SeriesRate> {
        let mut rates: Vec<SeriesRate> = self
            .series
            .iter()
            .map(|entry| SeriesRate {
                method: entry.key().method.clone(),
                path: entry.key().path.clone(),
                count: entry.value().total.load(Ordering::Acquire),
            })
            .collect();
        rates.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.method.cmp(&b.method)));
        rates
    }

    /// Tick on the configured interval until shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        tracing::debug!(
            slots = self.slot_count,
            interval_ms = self.interval.as_millis() as u64,
            "Rate bucket ticker started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                _ = shutdown.recv() => {
                    tracing::debug!("Rate bucket ticker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
