//! Snapshot loader: one logical read of everything persisted for a chart.

use crate::chart::ChartView;
use crate::store::{ChartStore, StoreError};
use crate::types::{ChartId, DbId};

/// What the planner diffs against.
pub type CurrentSnapshot = ChartView;

/// Load a chart owned by `user_id` with its furniture and assignments.
///
/// Returns `Ok(None)` when the chart does not exist or belongs to someone
/// else. The furniture and assignment reads are independent and run
/// concurrently; they are not a consistent cut, which the planner tolerates.
pub async fn load_snapshot<S: ChartStore>(
    store: &S,
    user_id: DbId,
    chart_id: ChartId,
) -> Result<Option<CurrentSnapshot>, StoreError> {
    let Some(chart) = store.find_chart(user_id, chart_id).await? else {
        return Ok(None);
    };

    let (furniture, assignments) = futures::try_join!(
        store.list_furniture(chart_id),
        store.list_assignments(chart_id),
    )?;

    tracing::debug!(
        %chart_id,
        furniture = furniture.len(),
        assignments = assignments.len(),
        "Loaded chart snapshot",
    );

    Ok(Some(ChartView {
        chart,
        furniture,
        assignments,
    }))
}
