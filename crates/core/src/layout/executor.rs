//! Transaction executor: applies batches strictly in order.
//!
//! Each batch is one atomic store write. Batches are never run concurrently
//! and never rolled back once committed: if batch N fails, batches before it
//! stay applied, execution stops, and the report carries exactly the counts
//! of the committed batches plus the steps of the batch that failed.

use std::collections::BTreeSet;

use crate::layout::batch::{partition, Batch};
use crate::layout::change_set::{ChangeCounts, ChangeKind, ChangeSet, TransactionSummary};
use crate::layout::planner::PlanError;
use crate::store::{ChartStore, StoreError};

/// The batch that stopped execution.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub batch_index: usize,
    /// Logical steps contained in the failed batch, in application order.
    pub steps: Vec<ChangeKind>,
    pub error: StoreError,
}

/// Outcome of applying a change-set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionReport {
    /// Counts of committed operations only.
    pub counts: ChangeCounts,
    pub batches_total: usize,
    pub batches_committed: usize,
    pub failure: Option<BatchFailure>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn summary(&self) -> TransactionSummary {
        TransactionSummary {
            success: self.is_success(),
            counts: self.counts,
        }
    }
}

impl std::fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} batches committed",
            self.batches_committed, self.batches_total
        )?;
        if let Some(failure) = &self.failure {
            let steps: Vec<&str> = failure.steps.iter().map(ChangeKind::as_str).collect();
            write!(
                f,
                "; batch {} ({}) failed: {}",
                failure.batch_index + 1,
                steps.join(", "),
                failure.error
            )?;
        }
        Ok(())
    }
}

/// Partition `change_set` by the store's limits and apply it.
///
/// Partitioning errors surface before any write.
pub async fn execute<S: ChartStore>(
    store: &S,
    change_set: ChangeSet,
) -> Result<ExecutionReport, PlanError> {
    let batches = partition(change_set.into_operations(), &store.limits())?;
    Ok(execute_batches(store, batches).await)
}

/// Apply pre-cut batches in order, stopping at the first failure.
pub async fn execute_batches<S: ChartStore>(store: &S, batches: Vec<Batch>) -> ExecutionReport {
    let mut report = ExecutionReport {
        batches_total: batches.len(),
        ..Default::default()
    };

    for batch in batches {
        tracing::debug!(
            batch = batch.index + 1,
            of = report.batches_total,
            ops = batch.ops.len(),
            bytes = batch.bytes,
            "Submitting batch",
        );

        match store.transact_write(&batch.ops).await {
            Ok(()) => {
                for op in &batch.ops {
                    report.counts.record(op.kind());
                }
                report.batches_committed += 1;
            }
            Err(error) => {
                let steps: BTreeSet<ChangeKind> = batch.ops.iter().map(|op| op.kind()).collect();
                report.failure = Some(BatchFailure {
                    batch_index: batch.index,
                    steps: steps.into_iter().collect(),
                    error,
                });
                break;
            }
        }
    }

    report
}
