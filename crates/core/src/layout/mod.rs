//! Layout reconciliation engine.
//!
//! A client submits the full desired layout of a chart. The engine loads what
//! is persisted ([`loader`]), diffs the two into an ordered [`ChangeSet`]
//! ([`planner`]), cuts it into store-sized atomic batches ([`batch`]) and
//! applies them in order ([`executor`]). [`reconcile`] wires the steps
//! together for the layout endpoint.
//!
//! A reconciliation that spans several batches is only atomic per batch: if a
//! later batch fails, earlier ones stay committed and the caller receives
//! [`ReconcileError::PartialTransaction`] with the exact committed counts.

pub mod batch;
pub mod change_set;
pub mod desired;
pub mod executor;
pub mod loader;
pub mod planner;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{partition, Batch, TransactLimits};
pub use change_set::{ChangeCounts, ChangeKind, ChangeSet, StoreOp, TransactionSummary};
pub use desired::{
    AssignmentDescriptor, DesiredLayout, FurnitureDescriptor, LayoutRequest,
    LayoutUpdateResponse, SeatDescriptor,
};
pub use executor::{execute, BatchFailure, ExecutionReport};
pub use loader::{load_snapshot, CurrentSnapshot};
pub use planner::{plan, plan_with_ids, CapacityViolation, LayoutIssue, PlanError};
pub use reconcile::{reconcile_layout, ReconcileError, TransactionResult};
