//! Load, plan, execute and reload: one layout update end to end.

use crate::chart::ChartView;
use crate::layout::change_set::{ChangeCounts, TransactionSummary};
use crate::layout::desired::{DesiredLayout, LayoutUpdateResponse};
use crate::layout::executor::{execute, ExecutionReport};
use crate::layout::loader::load_snapshot;
use crate::layout::planner::{plan, PlanError};
use crate::store::{ChartStore, StoreError};
use crate::types::{ChartId, DbId};

/// Result of a fully applied layout update.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    pub success: bool,
    pub counts: ChangeCounts,
    /// The chart as re-read after the last batch. `None` when that read failed;
    /// the writes themselves are committed either way.
    pub chart: Option<ChartView>,
}

impl TransactionResult {
    pub fn summary(&self) -> TransactionSummary {
        TransactionSummary {
            success: self.success,
            counts: self.counts,
        }
    }
}

impl From<TransactionResult> for LayoutUpdateResponse {
    fn from(result: TransactionResult) -> Self {
        Self {
            transaction: result.summary(),
            chart: result.chart,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconcileError {
    /// The chart does not exist or belongs to another user.
    #[error("Chart {0} not found")]
    NotFound(ChartId),

    /// The layout was rejected before any write.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The store failed before anything was committed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Some batches committed, then one failed. Earlier batches stay applied.
    #[error("Layout partially applied: {report}")]
    PartialTransaction { report: ExecutionReport },
}

impl ReconcileError {
    /// The `transaction` object to report for a failure that reached the
    /// store. `None` for failures that precede any write attempt.
    pub fn transaction_summary(&self) -> Option<TransactionSummary> {
        match self {
            Self::Store(_) => Some(TransactionSummary::default()),
            Self::PartialTransaction { report } => Some(report.summary()),
            Self::NotFound(_) | Self::Plan(_) => None,
        }
    }
}

/// Move the persisted layout of `chart_id` to `desired`.
///
/// Validation and capacity problems fail before any write. A submission that
/// already matches the persisted state performs no writes.
pub async fn reconcile_layout<S: ChartStore>(
    store: &S,
    user_id: DbId,
    chart_id: ChartId,
    desired: &DesiredLayout,
) -> Result<TransactionResult, ReconcileError> {
    let current = load_snapshot(store, user_id, chart_id)
        .await?
        .ok_or(ReconcileError::NotFound(chart_id))?;

    let change_set = plan(&current, desired)?;
    if change_set.is_empty() {
        tracing::debug!(%chart_id, "Layout already up to date");
        return Ok(TransactionResult {
            success: true,
            counts: ChangeCounts::default(),
            chart: Some(current),
        });
    }

    let planned = change_set.counts();
    tracing::info!(
        %chart_id,
        user_id,
        furniture_created = planned.furniture_created,
        furniture_updated = planned.furniture_updated,
        furniture_deleted = planned.furniture_deleted,
        assignments_created = planned.assignments_created,
        assignments_updated = planned.assignments_updated,
        assignments_deleted = planned.assignments_deleted,
        "Planned layout update",
    );

    let report = execute(store, change_set).await?;

    if let Some(failure) = &report.failure {
        if report.batches_committed == 0 {
            tracing::error!(%chart_id, error = %failure.error, "Layout update failed, nothing committed");
            return Err(ReconcileError::Store(failure.error.clone()));
        }
        tracing::warn!(%chart_id, %report, "Layout update partially applied");
        return Err(ReconcileError::PartialTransaction { report });
    }

    tracing::debug!(%chart_id, batches = report.batches_committed, "Layout update committed");

    let chart = match load_snapshot(store, user_id, chart_id).await {
        Ok(Some(view)) => Some(view),
        Ok(None) => {
            tracing::warn!(%chart_id, "Chart vanished after layout update");
            None
        }
        Err(e) => {
            tracing::warn!(%chart_id, error = %e, "Failed to reload chart after layout update");
            None
        }
    };

    Ok(TransactionResult {
        success: true,
        counts: report.counts,
        chart,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::layout::batch::TransactLimits;
    use crate::layout::desired::{AssignmentDescriptor, SeatDescriptor};
    use crate::layout::testing::{descriptor_for, new_descriptor, snapshot, MemoryStore, OWNER};

    fn store(view: ChartView) -> MemoryStore {
        MemoryStore::new(view, TransactLimits::default())
    }

    #[tokio::test]
    async fn applies_layout_and_returns_fresh_chart() {
        let current = snapshot(2, &[(0, 0, "p1"), (1, 1, "p2")]);
        let chart_id = current.chart.chart_id;
        let mut table = new_descriptor("t", 2);
        table.seats = vec![SeatDescriptor {
            seat_index: 1,
            person_id: "p3".into(),
        }];
        let desired = DesiredLayout {
            furniture: vec![descriptor_for(&current.furniture[0]), table],
            assignments: vec![AssignmentDescriptor {
                furniture_id: Some(current.furniture[0].furniture_id),
                furniture_key: None,
                seat_index: 0,
                person_id: "p2".into(),
            }],
        };
        let store = store(current);

        let result = reconcile_layout(&store, OWNER, chart_id, &desired)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.counts.furniture_created, 1);
        assert_eq!(result.counts.furniture_deleted, 1);
        assert_eq!(result.counts.assignments_updated, 1);
        assert_eq!(result.counts.assignments_deleted, 1);
        assert_eq!(result.counts.assignments_created, 1);

        let chart = result.chart.unwrap();
        assert_eq!(chart, store.view());
        assert_eq!(chart.furniture.len(), 2);
        assert_eq!(chart.assignments.len(), 2);
    }

    #[tokio::test]
    async fn unchanged_layout_writes_nothing() {
        let current = snapshot(1, &[(0, 2, "p1")]);
        let chart_id = current.chart.chart_id;
        let mut desc = descriptor_for(&current.furniture[0]);
        desc.seats = vec![SeatDescriptor {
            seat_index: 2,
            person_id: "p1".into(),
        }];
        let desired = DesiredLayout {
            furniture: vec![desc],
            assignments: vec![],
        };
        let store = store(current.clone());

        let result = reconcile_layout(&store, OWNER, chart_id, &desired)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.counts.total(), 0);
        assert_eq!(result.chart, Some(current));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_chart_is_not_found() {
        let current = snapshot(1, &[]);
        let chart_id = current.chart.chart_id;
        let store = store(current);

        let err = reconcile_layout(&store, OWNER + 1, chart_id, &DesiredLayout::default())
            .await
            .unwrap_err();
        assert_eq!(err, ReconcileError::NotFound(chart_id));
        assert_eq!(err.transaction_summary(), None);
    }

    #[tokio::test]
    async fn rejected_layout_writes_nothing() {
        let current = snapshot(1, &[(0, 0, "p1")]);
        let chart_id = current.chart.chart_id;
        let mut desc = descriptor_for(&current.furniture[0]);
        desc.seats = vec![SeatDescriptor {
            seat_index: 9,
            person_id: "p1".into(),
        }];
        let desired = DesiredLayout {
            furniture: vec![desc],
            assignments: vec![],
        };
        let store = store(current.clone());

        let err = reconcile_layout(&store, OWNER, chart_id, &desired)
            .await
            .unwrap_err();

        assert_matches!(err, ReconcileError::Plan(PlanError::Capacity(_)));
        assert_eq!(store.calls(), 0);
        assert_eq!(store.view(), current);
    }

    #[tokio::test]
    async fn later_batch_failure_is_partial() {
        let current = snapshot(0, &[]);
        let chart_id = current.chart.chart_id;
        let desired = DesiredLayout {
            furniture: (0..5).map(|i| new_descriptor(&format!("t{i}"), 1)).collect(),
            assignments: vec![],
        };
        let store = MemoryStore::new(current, TransactLimits::new(2, usize::MAX)).failing_on(2);

        let err = reconcile_layout(&store, OWNER, chart_id, &desired)
            .await
            .unwrap_err();

        let summary = err.transaction_summary().unwrap();
        assert!(!summary.success);
        assert_eq!(summary.counts.furniture_created, 2);
        assert_matches!(
            err,
            ReconcileError::PartialTransaction { report } if report.batches_committed == 1
        );
        assert_eq!(store.calls(), 2);
        assert_eq!(store.view().furniture.len(), 2);
    }

    #[tokio::test]
    async fn first_batch_failure_is_a_store_error() {
        let current = snapshot(0, &[]);
        let chart_id = current.chart.chart_id;
        let desired = DesiredLayout {
            furniture: vec![new_descriptor("t", 2)],
            assignments: vec![],
        };
        let store = MemoryStore::new(current, TransactLimits::default()).failing_on(1);

        let err = reconcile_layout(&store, OWNER, chart_id, &desired)
            .await
            .unwrap_err();

        assert_matches!(err, ReconcileError::Store(StoreError::Unavailable(_)));
        assert_eq!(err.transaction_summary(), Some(TransactionSummary::default()));
    }

    #[tokio::test]
    async fn response_carries_summary_and_chart() {
        let result = TransactionResult {
            success: true,
            counts: ChangeCounts {
                assignments_created: 3,
                ..Default::default()
            },
            chart: None,
        };
        let response = LayoutUpdateResponse::from(result);
        assert!(response.transaction.success);
        assert_eq!(response.transaction.counts.assignments_created, 3);
        assert!(response.chart.is_none());
    }
}
