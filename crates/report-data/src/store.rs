//! The shared aggregate store.
//!
//! Maps (device, year-month, sensor) to running min/max/sum/count. All
//! worker tasks fold into one store concurrently; a single mutex guards the
//! whole find-or-create-and-update sequence so no update is lost and no key
//! is ever created twice. The critical section is a hash lookup plus four
//! arithmetic updates, so coarse locking is not a bottleneck for this job.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use report_core::models::{AggregateEntry, AggregateKey, Reading, Sensor, SummaryRow};

// ── AggregateStore ─────────────────────────────────────────────────────────────

/// Concurrent map of [`AggregateKey`] to [`AggregateEntry`].
///
/// Shared by reference across the worker pool during ingestion; consumed
/// exclusively (via [`AggregateStore::into_rows`]) once the pipeline has
/// joined.
#[derive(Debug, Default)]
pub struct AggregateStore {
    entries: Mutex<HashMap<AggregateKey, AggregateEntry>>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value into the entry for (device, year-month, sensor),
    /// creating the entry on first sight.
    ///
    /// Find-or-create and the update happen under one lock acquisition, so
    /// concurrent folds on the same key serialize cleanly.
    pub fn fold(&self, device: &str, year_month: u32, sensor: Sensor, value: f64) {
        let key = AggregateKey {
            device: device.to_string(),
            year_month,
            sensor,
        };

        let mut entries = self.lock();
        match entries.entry(key) {
            Entry::Occupied(mut occupied) => occupied.get_mut().fold(value),
            Entry::Vacant(vacant) => {
                vacant.insert(AggregateEntry::new(value));
            }
        }
    }

    /// Fold all six sensor values of one accepted reading.
    pub fn fold_reading(&self, reading: &Reading) {
        let year_month = reading.year_month();
        for sensor in Sensor::ALL {
            self.fold(
                &reading.device,
                year_month,
                sensor,
                reading.values[sensor.index()],
            );
        }
    }

    /// Number of distinct aggregate keys seen so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the entry for `key`, if present. Mainly useful in tests.
    pub fn get(&self, key: &AggregateKey) -> Option<AggregateEntry> {
        self.lock().get(key).cloned()
    }

    /// Consume the store and project every entry into a [`SummaryRow`],
    /// computing the mean at this point (it is never stored). Row order is
    /// incidental; the report layer sorts.
    pub fn into_rows(self) -> Vec<SummaryRow> {
        let entries = self
            .entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        entries
            .into_iter()
            .map(|(key, entry)| SummaryRow {
                device: key.device,
                year_month: key.year_month,
                sensor: key.sensor.label().to_string(),
                max: entry.max,
                mean: entry.mean(),
                min: entry.min,
            })
            .collect()
    }

    /// Lock the map, recovering from a poisoned lock.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AggregateKey, AggregateEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
