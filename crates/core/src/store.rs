//! Entity store adapter contract.
//!
//! The reconciliation engine only needs chart lookup, two list queries and a
//! bounded multi-item atomic write. Implementations (PostgreSQL in
//! `seatplan-db`, in-memory in tests) own their own retry policy; the engine
//! never retries.

use std::future::Future;

use crate::chart::{Assignment, Chart, Furniture};
use crate::layout::{StoreOp, TransactLimits};
use crate::types::{ChartId, DbId};

/// Failures reported by an entity store adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// An item-level condition did not hold (row missing, key already taken,
    /// dangling reference). The transaction was rolled back.
    #[error("Condition failed: {0}")]
    ConditionFailed(String),

    /// Transport or throttling failure that outlived the adapter's retries.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Typed access to charts, furniture and assignments.
pub trait ChartStore: Send + Sync {
    /// Look up a chart owned by `user_id`. Charts owned by someone else are `None`.
    fn find_chart(
        &self,
        user_id: DbId,
        chart_id: ChartId,
    ) -> impl Future<Output = Result<Option<Chart>, StoreError>> + Send;

    /// All furniture currently persisted for a chart.
    fn list_furniture(
        &self,
        chart_id: ChartId,
    ) -> impl Future<Output = Result<Vec<Furniture>, StoreError>> + Send;

    /// All assignments currently persisted for a chart.
    fn list_assignments(
        &self,
        chart_id: ChartId,
    ) -> impl Future<Output = Result<Vec<Assignment>, StoreError>> + Send;

    /// Apply `ops` as one atomic unit: either every operation takes effect or none does.
    ///
    /// Callers must keep `ops` within [`ChartStore::limits`].
    fn transact_write(&self, ops: &[StoreOp])
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Maximum item count and payload size of one [`ChartStore::transact_write`] call.
    fn limits(&self) -> TransactLimits;
}
