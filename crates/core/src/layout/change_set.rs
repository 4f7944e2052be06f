//! Planner output and the store operations it expands into.

use serde::{Deserialize, Serialize};

use crate::chart::{Assignment, Furniture};
use crate::types::ChartId;

/// The kind of a single planned change.
///
/// Variants are declared in the order operations are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    FurnitureCreate,
    FurnitureUpdate,
    AssignmentDelete,
    FurnitureDelete,
    AssignmentCreate,
    AssignmentUpdate,
}

impl ChangeKind {
    /// String representation for display and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FurnitureCreate => "furniture_create",
            Self::FurnitureUpdate => "furniture_update",
            Self::AssignmentDelete => "assignment_delete",
            Self::FurnitureDelete => "furniture_delete",
            Self::AssignmentCreate => "assignment_create",
            Self::AssignmentUpdate => "assignment_update",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One write against the entity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "item", rename_all = "snake_case")]
pub enum StoreOp {
    CreateFurniture(Furniture),
    UpdateFurniture(Furniture),
    DeleteAssignment(Assignment),
    DeleteFurniture(Furniture),
    CreateAssignment(Assignment),
    UpdateAssignment(Assignment),
}

impl StoreOp {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::CreateFurniture(_) => ChangeKind::FurnitureCreate,
            Self::UpdateFurniture(_) => ChangeKind::FurnitureUpdate,
            Self::DeleteAssignment(_) => ChangeKind::AssignmentDelete,
            Self::DeleteFurniture(_) => ChangeKind::FurnitureDelete,
            Self::CreateAssignment(_) => ChangeKind::AssignmentCreate,
            Self::UpdateAssignment(_) => ChangeKind::AssignmentUpdate,
        }
    }

    pub fn chart_id(&self) -> ChartId {
        match self {
            Self::CreateFurniture(f) | Self::UpdateFurniture(f) | Self::DeleteFurniture(f) => {
                f.chart_id
            }
            Self::DeleteAssignment(a) | Self::CreateAssignment(a) | Self::UpdateAssignment(a) => {
                a.chart_id
            }
        }
    }

    /// Size of the operation as it would travel to the store.
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(self).map_or(0, |bytes| bytes.len())
    }
}

/// Ordered create/update/delete sequences moving persisted state to a desired layout.
///
/// `assignments_to_delete` always contains every assignment that sits on
/// furniture listed in `furniture_to_delete`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub furniture_to_create: Vec<Furniture>,
    pub furniture_to_update: Vec<Furniture>,
    pub furniture_to_delete: Vec<Furniture>,
    pub assignments_to_create: Vec<Assignment>,
    pub assignments_to_update: Vec<Assignment>,
    pub assignments_to_delete: Vec<Assignment>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.furniture_to_create.len()
            + self.furniture_to_update.len()
            + self.furniture_to_delete.len()
            + self.assignments_to_create.len()
            + self.assignments_to_update.len()
            + self.assignments_to_delete.len()
    }

    /// Counts that applying the whole change-set would produce.
    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            furniture_created: self.furniture_to_create.len() as u32,
            furniture_updated: self.furniture_to_update.len() as u32,
            furniture_deleted: self.furniture_to_delete.len() as u32,
            assignments_created: self.assignments_to_create.len() as u32,
            assignments_updated: self.assignments_to_update.len() as u32,
            assignments_deleted: self.assignments_to_delete.len() as u32,
        }
    }

    /// Flatten into store operations in application order:
    /// furniture creates, furniture updates, assignment deletes, furniture
    /// deletes, assignment creates, assignment updates.
    ///
    /// With this order no operation references furniture that is not yet
    /// created or already deleted, however the sequence is later cut.
    pub fn into_operations(self) -> Vec<StoreOp> {
        let mut ops = Vec::with_capacity(self.len());
        ops.extend(self.furniture_to_create.into_iter().map(StoreOp::CreateFurniture));
        ops.extend(self.furniture_to_update.into_iter().map(StoreOp::UpdateFurniture));
        ops.extend(
            self.assignments_to_delete
                .into_iter()
                .map(StoreOp::DeleteAssignment),
        );
        ops.extend(self.furniture_to_delete.into_iter().map(StoreOp::DeleteFurniture));
        ops.extend(
            self.assignments_to_create
                .into_iter()
                .map(StoreOp::CreateAssignment),
        );
        ops.extend(
            self.assignments_to_update
                .into_iter()
                .map(StoreOp::UpdateAssignment),
        );
        ops
    }
}

/// Per-category counts of applied changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub furniture_created: u32,
    pub furniture_updated: u32,
    pub furniture_deleted: u32,
    pub assignments_created: u32,
    pub assignments_updated: u32,
    pub assignments_deleted: u32,
}

impl ChangeCounts {
    pub fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::FurnitureCreate => self.furniture_created += 1,
            ChangeKind::FurnitureUpdate => self.furniture_updated += 1,
            ChangeKind::FurnitureDelete => self.furniture_deleted += 1,
            ChangeKind::AssignmentCreate => self.assignments_created += 1,
            ChangeKind::AssignmentUpdate => self.assignments_updated += 1,
            ChangeKind::AssignmentDelete => self.assignments_deleted += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.furniture_created
            + self.furniture_updated
            + self.furniture_deleted
            + self.assignments_created
            + self.assignments_updated
            + self.assignments_deleted
    }
}

/// The `transaction` object of the layout endpoint response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub success: bool,
    #[serde(flatten)]
    pub counts: ChangeCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::testing::{assignment, chart_id, furniture};

    #[test]
    fn operations_follow_application_order() {
        let chart = chart_id();
        let kept = furniture(chart, 4);
        let gone = furniture(chart, 4);
        let fresh = furniture(chart, 2);

        let set = ChangeSet {
            furniture_to_create: vec![fresh.clone()],
            furniture_to_update: vec![kept.clone()],
            furniture_to_delete: vec![gone.clone()],
            assignments_to_create: vec![assignment(chart, fresh.furniture_id, 0, "p1")],
            assignments_to_update: vec![assignment(chart, kept.furniture_id, 0, "p2")],
            assignments_to_delete: vec![assignment(chart, gone.furniture_id, 0, "p3")],
        };

        let kinds: Vec<ChangeKind> = set.into_operations().iter().map(StoreOp::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::FurnitureCreate,
                ChangeKind::FurnitureUpdate,
                ChangeKind::AssignmentDelete,
                ChangeKind::FurnitureDelete,
                ChangeKind::AssignmentCreate,
                ChangeKind::AssignmentUpdate,
            ]
        );
    }

    #[test]
    fn counts_record_each_kind() {
        let mut counts = ChangeCounts::default();
        counts.record(ChangeKind::FurnitureCreate);
        counts.record(ChangeKind::AssignmentDelete);
        counts.record(ChangeKind::AssignmentDelete);
        assert_eq!(counts.furniture_created, 1);
        assert_eq!(counts.assignments_deleted, 2);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn summary_serializes_flat() {
        let summary = TransactionSummary {
            success: true,
            counts: ChangeCounts {
                furniture_created: 2,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["furnitureCreated"], 2);
        assert_eq!(json["assignmentsDeleted"], 0);
    }
}
