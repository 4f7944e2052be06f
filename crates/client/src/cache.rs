//! In-memory query cache.
//!
//! Every entry is the last server answer (or an optimistic edit of it) for one
//! [`QueryKey`], plus a `stale` flag telling readers to refetch before trusting
//! it. The cache is cheap to clone; clones share the same entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use seatplan_core::chart::{Assignment, Chart, ChartView, Furniture};
use seatplan_core::types::ChartId;

use crate::keys::QueryKey;

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedData {
    Charts(Vec<Chart>),
    Chart(ChartView),
    Furniture(Vec<Furniture>),
    Assignments(Vec<Assignment>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: CachedData,
    pub stale: bool,
}

impl CacheEntry {
    pub fn fresh(data: CachedData) -> Self {
        Self { data, stale: false }
    }
}

/// Shared, thread-safe map from query key to cached result.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, CacheEntry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    /// Store `data` under `key` as a fresh entry.
    pub fn set(&self, key: QueryKey, data: CachedData) {
        self.lock().insert(key, CacheEntry::fresh(data));
    }

    /// Put back a previously captured entry. `None` means the key was absent.
    pub fn restore(&self, key: QueryKey, entry: Option<CacheEntry>) {
        let mut entries = self.lock();
        match entry {
            Some(entry) => {
                entries.insert(key, entry);
            }
            None => {
                entries.remove(&key);
            }
        }
    }

    pub fn remove(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.lock().remove(key)
    }

    /// Mark `key` stale. Returns `false` when nothing was cached for it.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        match self.lock().get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Whether `key` must be fetched before it can be read: missing or stale.
    pub fn needs_fetch(&self, key: &QueryKey) -> bool {
        self.lock().get(key).map_or(true, |entry| entry.stale)
    }

    /// Edit the cached data in place, keeping its stale flag.
    ///
    /// Returns `false` when nothing was cached for `key`.
    pub fn update<F>(&self, key: &QueryKey, f: F) -> bool
    where
        F: FnOnce(&mut CachedData),
    {
        match self.lock().get_mut(key) {
            Some(entry) => {
                f(&mut entry.data);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // -----------------------------------------------------------------------
    // Typed accessors
    // -----------------------------------------------------------------------

    pub fn charts(&self) -> Option<Vec<Chart>> {
        match self.get(&QueryKey::Charts)?.data {
            CachedData::Charts(charts) => Some(charts),
            _ => None,
        }
    }

    pub fn chart_view(&self, chart_id: ChartId) -> Option<ChartView> {
        match self.get(&QueryKey::Chart(chart_id))?.data {
            CachedData::Chart(view) => Some(view),
            _ => None,
        }
    }

    /// Replace everything cached for `view`'s chart with `view`.
    ///
    /// Writes the chart, furniture and assignment entries as fresh, and
    /// refreshes the chart's row in the chart list if the list is cached.
    pub fn store_chart_view(&self, view: ChartView) {
        let chart_id = view.chart.chart_id;
        let mut entries = self.lock();

        if let Some(CacheEntry {
            data: CachedData::Charts(charts),
            ..
        }) = entries.get_mut(&QueryKey::Charts)
        {
            if let Some(row) = charts.iter_mut().find(|c| c.chart_id == chart_id) {
                *row = view.chart.clone();
            }
        }

        entries.insert(
            QueryKey::Furniture(chart_id),
            CacheEntry::fresh(CachedData::Furniture(view.furniture.clone())),
        );
        entries.insert(
            QueryKey::Assignments(chart_id),
            CacheEntry::fresh(CachedData::Assignments(view.assignments.clone())),
        );
        entries.insert(QueryKey::Chart(chart_id), CacheEntry::fresh(CachedData::Chart(view)));
    }

    /// Mark every entry derived from one chart's layout stale.
    pub fn invalidate_chart(&self, chart_id: ChartId) {
        let mut entries = self.lock();
        for key in QueryKey::chart_scope(chart_id) {
            if let Some(entry) = entries.get_mut(&key) {
                entry.stale = true;
            }
        }
    }

    /// Drop every entry derived from one chart's layout.
    pub fn remove_chart(&self, chart_id: ChartId) {
        let mut entries = self.lock();
        for key in QueryKey::chart_scope(chart_id) {
            entries.remove(&key);
        }
    }
}
