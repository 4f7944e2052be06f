use sqlx::FromRow;
use seatplan_core::chart::Assignment;
use seatplan_core::types::{ChartId, FurnitureId, PersonId};

/// A row from the `assignments` table.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub chart_id: ChartId,
    pub furniture_id: FurnitureId,
    pub seat_index: i32,
    pub person_id: PersonId,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Self {
            chart_id: row.chart_id,
            furniture_id: row.furniture_id,
            seat_index: row.seat_index,
            person_id: row.person_id,
        }
    }
}
