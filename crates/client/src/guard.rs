//! Snapshot-and-restore guard around a cache mutation.

use seatplan_core::chart::ChartView;
use seatplan_core::types::ChartId;

use crate::cache::{CacheEntry, QueryCache};
use crate::keys::QueryKey;

/// Captures cache entries before a mutation is sent and puts them back
/// verbatim unless the mutation is committed.
///
/// Dropping the guard without calling [`MutationGuard::commit`] or
/// [`MutationGuard::confirm`] restores the snapshot. That covers both an error
/// response and a cancelled request future.
#[must_use = "dropping the guard immediately restores the snapshot"]
#[derive(Debug)]
pub struct MutationGuard {
    cache: QueryCache,
    snapshot: Vec<(QueryKey, Option<CacheEntry>)>,
    settled: bool,
}

impl MutationGuard {
    /// Snapshot the given keys.
    pub fn capture<I>(cache: &QueryCache, keys: I) -> Self
    where
        I: IntoIterator<Item = QueryKey>,
    {
        let snapshot = keys.into_iter().map(|key| (key, cache.get(&key))).collect();
        Self {
            cache: cache.clone(),
            snapshot,
            settled: false,
        }
    }

    /// Snapshot the chart view and its furniture and assignment entries.
    pub fn for_chart(cache: &QueryCache, chart_id: ChartId) -> Self {
        Self::capture(cache, QueryKey::chart_scope(chart_id))
    }

    /// The entry captured for `key`, if it was part of the snapshot and cached.
    pub fn snapshot(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.snapshot
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, entry)| entry.as_ref())
    }

    /// Discard the snapshot and apply the server's chart view.
    ///
    /// A missing view means the server committed but could not read the chart
    /// back; every entry for `chart_id` is marked stale instead.
    pub fn commit(mut self, chart_id: ChartId, chart: Option<ChartView>) {
        match chart {
            Some(view) => self.cache.store_chart_view(view),
            None => self.cache.invalidate_chart(chart_id),
        }
        self.settled = true;
    }

    /// Discard the snapshot and keep the cache as it is now.
    pub fn confirm(mut self) {
        self.settled = true;
    }

    /// Restore the snapshot now.
    pub fn rollback(self) {}
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        for (key, entry) in self.snapshot.drain(..) {
            self.cache.restore(key, entry);
        }
        tracing::debug!("Mutation not committed, cache snapshot restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedData;
    use crate::mutations::tests::sample_view;

    #[test]
    fn drop_without_commit_restores_verbatim() {
        let cache = QueryCache::new();
        let view = sample_view("Room 1", 1);
        let chart_id = view.chart.chart_id;
        cache.store_chart_view(view.clone());
        cache.invalidate(&QueryKey::Furniture(chart_id));
        let before = cache.get(&QueryKey::Furniture(chart_id));

        let guard = MutationGuard::for_chart(&cache, chart_id);
        cache.remove_chart(chart_id);
        drop(guard);

        assert_eq!(cache.chart_view(chart_id), Some(view));
        assert_eq!(cache.get(&QueryKey::Furniture(chart_id)), before);
    }

    #[test]
    fn absent_keys_stay_absent_after_restore() {
        let cache = QueryCache::new();
        let view = sample_view("Room 1", 1);
        let chart_id = view.chart.chart_id;

        let guard = MutationGuard::for_chart(&cache, chart_id);
        cache.store_chart_view(view);
        guard.rollback();

        assert!(cache.is_empty());
    }

    #[test]
    fn commit_without_view_marks_chart_stale() {
        let cache = QueryCache::new();
        let view = sample_view("Room 1", 1);
        let chart_id = view.chart.chart_id;
        cache.store_chart_view(view);

        let guard = MutationGuard::for_chart(&cache, chart_id);
        assert!(guard.snapshot(&QueryKey::Chart(chart_id)).is_some());
        guard.commit(chart_id, None);

        for key in QueryKey::chart_scope(chart_id) {
            assert!(cache.needs_fetch(&key), "{key} should be stale");
        }
    }

    #[test]
    fn confirm_keeps_current_entries() {
        let cache = QueryCache::new();
        let guard = MutationGuard::capture(&cache, [QueryKey::Charts]);
        cache.set(QueryKey::Charts, CachedData::Charts(Vec::new()));
        guard.confirm();

        assert_eq!(cache.charts(), Some(Vec::new()));
    }
}
