//! Cache-aware chart operations.
//!
//! Reads go through the [`QueryCache`] and only hit the server for missing or
//! stale keys. Mutations are wrapped in a [`MutationGuard`]:
//!
//! | Mutation        | Before the request             | On success                   | On failure / cancel |
//! |-----------------|--------------------------------|------------------------------|---------------------|
//! | `create_chart`  | nothing                        | chart list marked stale      | nothing to undo     |
//! | `rename_chart`  | new name merged into the cache | server chart written back    | snapshot restored   |
//! | `delete_chart`  | chart removed from the cache   | removal kept                 | snapshot restored   |
//! | `update_layout` | snapshot only, no edits        | server chart view replaces   | snapshot restored   |
//! |                 |                                | chart, furniture, assignments|                     |

use seatplan_core::chart::{Chart, ChartView};
use seatplan_core::layout::{DesiredLayout, LayoutUpdateResponse};
use seatplan_core::types::ChartId;

use crate::api::{ChartApi, ClientError, DeletedChart};
use crate::cache::{CachedData, QueryCache};
use crate::guard::MutationGuard;
use crate::keys::QueryKey;

/// Chart API client backed by a local query cache.
pub struct ChartClient<A> {
    api: A,
    cache: QueryCache,
}

impl<A: ChartApi> ChartClient<A> {
    pub fn new(api: A) -> Self {
        Self::with_cache(api, QueryCache::new())
    }

    /// Share `cache` with other readers, e.g. the UI layer.
    pub fn with_cache(api: A, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The caller's charts, from cache when fresh.
    pub async fn charts(&self) -> Result<Vec<Chart>, ClientError> {
        if !self.cache.needs_fetch(&QueryKey::Charts) {
            if let Some(charts) = self.cache.charts() {
                return Ok(charts);
            }
        }

        let charts = self.api.list_charts().await?;
        self.cache
            .set(QueryKey::Charts, CachedData::Charts(charts.clone()));
        Ok(charts)
    }

    /// One chart with its layout, from cache when fresh.
    pub async fn chart(&self, chart_id: ChartId) -> Result<ChartView, ClientError> {
        if !self.cache.needs_fetch(&QueryKey::Chart(chart_id)) {
            if let Some(view) = self.cache.chart_view(chart_id) {
                return Ok(view);
            }
        }
        self.refresh_chart(chart_id).await
    }

    /// Fetch one chart from the server regardless of what is cached.
    pub async fn refresh_chart(&self, chart_id: ChartId) -> Result<ChartView, ClientError> {
        let view = self.api.get_chart(chart_id).await?;
        self.cache.store_chart_view(view.clone());
        Ok(view)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub async fn create_chart(
        &self,
        name: &str,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Chart, ClientError> {
        let chart = self.api.create_chart(name, metadata).await?;
        self.cache.invalidate(&QueryKey::Charts);
        tracing::debug!(chart_id = %chart.chart_id, "Chart created, chart list marked stale");
        Ok(chart)
    }

    /// Rename a chart, showing the new name in the cache while the request is
    /// in flight.
    pub async fn rename_chart(&self, chart_id: ChartId, name: &str) -> Result<Chart, ClientError> {
        let guard = MutationGuard::capture(&self.cache, [QueryKey::Charts, QueryKey::Chart(chart_id)]);
        self.merge_chart(chart_id, |chart| chart.name = name.to_string());

        let chart = match self.api.rename_chart(chart_id, name).await {
            Ok(chart) => chart,
            Err(err) => {
                tracing::warn!(chart_id = %chart_id, error = %err, "Chart rename failed, rolling back");
                return Err(err);
            }
        };

        self.merge_chart(chart_id, |cached| *cached = chart.clone());
        guard.confirm();
        Ok(chart)
    }

    /// Delete a chart, removing it from the cache while the request is in flight.
    pub async fn delete_chart(&self, chart_id: ChartId) -> Result<DeletedChart, ClientError> {
        let keys = std::iter::once(QueryKey::Charts).chain(QueryKey::chart_scope(chart_id));
        let guard = MutationGuard::capture(&self.cache, keys);

        self.cache.update(&QueryKey::Charts, |data| {
            if let CachedData::Charts(charts) = data {
                charts.retain(|c| c.chart_id != chart_id);
            }
        });
        self.cache.remove_chart(chart_id);

        match self.api.delete_chart(chart_id).await {
            Ok(deleted) => {
                guard.confirm();
                Ok(deleted)
            }
            Err(err) => {
                tracing::warn!(chart_id = %chart_id, error = %err, "Chart delete failed, rolling back");
                Err(err)
            }
        }
    }

    /// Submit a desired layout.
    ///
    /// The cache is left untouched while the request is in flight. On success
    /// the server's chart view replaces the chart, furniture and assignment
    /// entries. On any error, on a response whose transaction reports
    /// failure, or if this future is dropped first, those entries are restored
    /// to what they were when the call started. Server errors are returned
    /// unchanged.
    pub async fn update_layout(
        &self,
        chart_id: ChartId,
        layout: &DesiredLayout,
    ) -> Result<LayoutUpdateResponse, ClientError> {
        let guard = MutationGuard::for_chart(&self.cache, chart_id);

        let err = match self.api.update_layout(chart_id, layout).await {
            Ok(response) if response.transaction.success => {
                let counts = response.transaction.counts;
                tracing::debug!(
                    chart_id = %chart_id,
                    changes = counts.total(),
                    chart_returned = response.chart.is_some(),
                    "Layout update committed",
                );
                guard.commit(chart_id, response.chart.clone());
                return Ok(response);
            }
            Ok(response) => unsuccessful_layout(response),
            Err(err) => err,
        };

        tracing::warn!(
            chart_id = %chart_id,
            code = err.code().unwrap_or("REQUEST_FAILED"),
            error = %err,
            "Layout update failed, restoring cached chart",
        );
        Err(err)
    }

    /// Apply `f` to the chart's row in the chart list and to the chart view.
    fn merge_chart<F>(&self, chart_id: ChartId, f: F)
    where
        F: Fn(&mut Chart),
    {
        self.cache.update(&QueryKey::Charts, |data| {
            if let CachedData::Charts(charts) = data {
                charts
                    .iter_mut()
                    .filter(|c| c.chart_id == chart_id)
                    .for_each(&f);
            }
        });
        self.cache.update(&QueryKey::Chart(chart_id), |data| {
            if let CachedData::Chart(view) = data {
                f(&mut view.chart);
            }
        });
    }
}

/// A 2xx layout response whose transaction reports failure.
fn unsuccessful_layout(response: LayoutUpdateResponse) -> ClientError {
    let counts = response.transaction.counts;
    ClientError::Api {
        status: 200,
        code: "TRANSACTION_FAILED".to_string(),
        message: format!(
            "layout transaction reported failure after {} changes",
            counts.total()
        ),
        body: serde_json::to_value(&response).unwrap_or(serde_json::Value::Null),
    }
}
